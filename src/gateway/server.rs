// Coffer: HTTP server
//
// Binds a TCP listener and serves the router until Ctrl-C, letting
// in-flight requests finish.

use std::time::Duration;

use tokio::net::TcpListener;

use super::{router, AppState};
use crate::config::HttpServerConfig;

pub struct HttpServer {
    address: String,
    request_timeout: Duration,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: &HttpServerConfig, state: AppState) -> Self {
        Self {
            address: format!("{}:{}", config.host, config.port),
            request_timeout: config.timeout,
            state,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Serve until a shutdown signal arrives.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(&self.address).await?;
        tracing::info!(address = %self.address, "Coffer HTTP server listening");

        let app = router(self.state, self.request_timeout);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Coffer HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler the server runs until killed.
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
