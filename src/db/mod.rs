//! Database module providing connection management and query functions.

pub mod collects;
pub mod models;
pub mod roles;
pub mod users;
pub mod visits;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Connect to PostgreSQL using the configured URL.
pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(config.database_url.clone());
    opts.max_connections(20)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(config.is_development());

    Database::connect(opts)
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))
}
