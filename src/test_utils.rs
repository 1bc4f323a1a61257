use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use compute::notifications::{NotificationDispatcher, NotificationSink};
use compute::ComputeError;
use migration::{Migrator, MigratorTrait};
use model::entities::notification;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing_subscriber::EnvFilter;

use crate::config::{build_app_state, Settings};
use crate::router::create_router;
use crate::schemas::AppState;

/// A notification sink that is always down.
#[derive(Debug)]
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn send(
        &self,
        _user_id: i32,
        _category: &str,
        _message: String,
    ) -> compute::Result<notification::Model> {
        Err(ComputeError::Database(DbErr::Custom("notification sink offline".to_string())))
    }
}

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Log to the test harness, filtered by RUST_LOG. Safe to call repeatedly.
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_app_state() -> AppState {
    init_test_tracing();
    build_app_state(setup_test_db().await, &Settings::default())
}

/// Create axum app for testing
pub async fn setup_test_app() -> Router {
    create_router(setup_test_app_state().await)
}

pub async fn setup_test_server() -> TestServer {
    TestServer::new(setup_test_app().await).expect("Failed to start test server")
}

/// A server whose notification sink always fails.
pub async fn setup_test_server_with_failing_notifications() -> TestServer {
    let mut state = setup_test_app_state().await;
    let sink: Arc<dyn NotificationSink> = Arc::new(FailingSink);
    state.notifications = NotificationDispatcher::new(sink, state.settings.low_balance_threshold);
    TestServer::new(create_router(state)).expect("Failed to start test server")
}
