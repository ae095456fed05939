mod migrations;
mod server;

use anyhow::Result;
use tracing::info;

use signage_core::{
    bootstrap::{init_repositories, init_services, load_config},
    logging,
};

use server::SignageServer;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load and validate configuration
    let config = load_config()?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("Signage server starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Open the entity store and bring its schema up to date
    let (repos, pool) = init_repositories(&config).await?;
    if let Some(pool) = &pool {
        migrations::run_migrations(pool).await?;
    }

    // 4. Initialize services
    let services = init_services(&config, repos).await?;

    // 5. Serve until a shutdown signal arrives
    SignageServer::new(config, services).start().await?;

    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("Signage server stopped");
    Ok(())
}
