use anyhow::Result;
use sqlx::PgPool;
use tracing::{error, info};

/// Apply every pending migration from the workspace `migrations/` directory
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            anyhow::anyhow!("Migration failed: {e}")
        })?;

    info!("Migrations completed");
    Ok(())
}
