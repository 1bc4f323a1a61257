use anyhow::Result;
use sea_orm::Database;
use tracing::{debug, error, info};

use super::initdb::apply_migrations;
use super::serve::run_server;
use crate::config::{build_app_state, Settings};
use crate::router::create_router;

pub async fn migrate_and_serve(database_url: &str, bind_address: &str, settings: &Settings) -> Result<()> {
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", database_url);

    let db = match Database::connect(database_url).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };
    apply_migrations(&db).await?;

    let app = create_router(build_app_state(db, settings));
    run_server(app, bind_address).await
}
