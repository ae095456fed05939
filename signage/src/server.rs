//! Server lifecycle management
//!
//! Starts the HTTP server and the liveness reaper, and stops both on
//! SIGTERM or Ctrl+C.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use signage_core::{bootstrap::Services, Config};

pub struct SignageServer {
    config: Config,
    services: Services,
}

impl SignageServer {
    pub const fn new(config: Config, services: Services) -> Self {
        Self { config, services }
    }

    /// Start all components and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let reaper_handle = self
            .services
            .liveness_reaper
            .spawn(self.config.liveness.sweep_interval(), shutdown_rx.clone());

        let mut http_handle = self.start_http_server(shutdown_rx).await?;

        info!("All components started successfully");

        tokio::select! {
            _ = &mut http_handle => {
                error!("HTTP server stopped unexpectedly");
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        // Signal all components to shut down
        let _ = shutdown_tx.send(true);

        if !http_handle.is_finished() {
            if let Err(e) = http_handle.await {
                warn!("HTTP server task ended abnormally: {}", e);
            }
        }
        if let Err(e) = reaper_handle.await {
            warn!("Liveness reaper task ended abnormally: {}", e);
        }

        Ok(())
    }

    /// Bind the listener up front so a bad address fails startup
    async fn start_http_server(
        &self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<JoinHandle<()>> {
        let http_address = self.config.http_address();
        let http_router = signage_api::create_router(self.services.clone(), &self.config);

        let listener = tokio::net::TcpListener::bind(&http_address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_address}: {e}"))?;
        info!("HTTP server listening on {}", http_address);

        let handle = tokio::spawn(async move {
            let mut rx = shutdown_rx;
            let graceful = async move {
                let _ = rx.changed().await;
            };

            if let Err(e) = axum::serve(listener, http_router)
                .with_graceful_shutdown(graceful)
                .await
            {
                error!("HTTP server error: {}", e);
            }

            info!("HTTP server shut down gracefully");
        });

        Ok(handle)
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
