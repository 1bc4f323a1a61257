//! Shared fixtures for database-backed tests.

use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};

use model::entities::{account, user};

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None).await.expect("Migrations failed.");
    db
}

pub async fn create_user(db: &DatabaseConnection, email: &str) -> user::Model {
    user::ActiveModel {
        email: Set(email.to_string()),
        name: Set("Test User".to_string()),
        password_hash: Set("unused".to_string()),
        active: Set(true),
        registered_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create user")
}

pub async fn create_account(
    db: &DatabaseConnection,
    number: &str,
    balance: Decimal,
    owner_id: Option<i32>,
    active: bool,
) -> account::Model {
    let now = Utc::now().naive_utc();
    account::ActiveModel {
        account_number: Set(number.to_string()),
        holder: Set(format!("Holder of {number}")),
        balance: Set(balance),
        active: Set(active),
        owner_id: Set(owner_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create account")
}
