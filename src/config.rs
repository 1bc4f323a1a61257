use anyhow::Result;
use compute::notifications::{DatabaseNotificationSink, NotificationDispatcher};
use config::{Config, Environment};
use moka::future::Cache;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::schemas::{AppState, StatisticsCache};

/// Runtime tunables, read from `AHORROS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// A withdrawal leaving the balance strictly below this sends a
    /// `SALDO_BAJO` notification.
    pub low_balance_threshold: Decimal,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            low_balance_threshold: Decimal::ONE_HUNDRED,
            cache_capacity: 1000,
            cache_ttl_secs: 300,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::with_prefix("AHORROS"))
    }

    fn from_environment(environment: Environment) -> Result<Self> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("low_balance_threshold", defaults.low_balance_threshold.to_string())?
            .set_default("cache_capacity", defaults.cache_capacity)?
            .set_default("cache_ttl_secs", defaults.cache_ttl_secs)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .add_source(environment)
            .build()?
            .try_deserialize::<Settings>()?;

        if settings.low_balance_threshold < Decimal::ZERO {
            anyhow::bail!("low_balance_threshold must not be negative");
        }
        debug!(?settings, "Settings loaded");
        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builds the shared state around an open connection.
pub fn build_app_state(db: DatabaseConnection, settings: &Settings) -> AppState {
    let cache = StatisticsCache::new(
        Cache::builder()
            .max_capacity(settings.cache_capacity)
            .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
            .build(),
    );

    let notifications = NotificationDispatcher::new(
        Arc::new(DatabaseNotificationSink::new(db.clone())),
        settings.low_balance_threshold,
    );

    AppState {
        db,
        cache,
        notifications,
        settings: settings.clone(),
    }
}

/// Connects to `database_url` and builds the application state.
pub async fn initialize_app_state_with_url(database_url: &str, settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    Ok(build_app_state(db, settings))
}
