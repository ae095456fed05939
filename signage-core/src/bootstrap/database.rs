//! Database initialization

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::{repository::Repositories, Config};

/// Initialize database connection pool
///
/// Note: Migrations should be run separately by the binary crate.
pub async fn init_database(config: &Config) -> Result<PgPool> {
    info!("Connecting to database");

    let pool: PgPool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_seconds))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_seconds))
        .connect(config.database_url())
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            anyhow::anyhow!("Database connection failed: {}", e)
        })?;

    info!("Database connected successfully");

    Ok(pool)
}

/// Pick the entity store named by `database.url`.
///
/// Returns the pool alongside when PostgreSQL is used so the caller can migrate it.
pub async fn init_repositories(config: &Config) -> Result<(Repositories, Option<PgPool>)> {
    if config.database.is_memory() {
        warn!("Using the in-memory store; all data is lost on restart");
        return Ok((Repositories::memory(), None));
    }

    let pool = init_database(config).await?;
    Ok((Repositories::postgres(pool.clone()), Some(pool)))
}
