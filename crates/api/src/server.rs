//! HTTP server for the LedgerLens API.

use crate::config::ApiConfig;
use crate::database::init_database_with_config;
use crate::router::build_router;
use crate::{ApiError, AppState};
use axum::Router;
use ledgerlens_core::LedgerConfig;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

/// HTTP server for the LedgerLens API.
pub struct ApiServer {
    config: ApiConfig,
    ledger: LedgerConfig,
}

impl ApiServer {
    /// Create a server from the application configuration.
    pub fn new(ledger: LedgerConfig) -> Self {
        Self {
            config: ApiConfig::from_ledger_config(&ledger),
            ledger,
        }
    }

    /// Run the server until shutdown signal.
    pub async fn run(self) -> Result<(), ApiError> {
        let addr = self.config.bind_addr;

        info!("Starting LedgerLens API server");
        info!("API base path: {}", display_base(&self.config.api_base_path));
        info!("Dataset backend: {:?}", self.ledger.storage.backend);
        if self.ledger.line.channel_secret.is_none() {
            warn!("LINE_CHANNEL_SECRET not set; webhook deliveries will fail");
        }

        let pool = init_database_with_config(&self.ledger.database).await?;
        let state = AppState::from_config(&self.ledger, pool)?;
        let router = self.with_middleware(build_router(&self.config, state));

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ApiError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("Failed to bind to {}: {}", addr, e),
            ))
        })?;

        info!("Server listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Http(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Add the middleware layers.
    fn with_middleware(&self, mut router: Router) -> Router {
        if self.config.request_timeout_seconds > 0 {
            router = router.layer(tower_http::timeout::TimeoutLayer::new(
                std::time::Duration::from_secs(self.config.request_timeout_seconds),
            ));
        }

        if self.config.enable_request_logging {
            router = router.layer(tower_http::trace::TraceLayer::new_for_http());
        }

        router.layer(tower_http::limit::RequestBodyLimitLayer::new(
            self.config.max_body_size,
        ))
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Get the API configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

fn display_base(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal, shutting down..."),
            Err(err) => {
                warn!("failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM signal, shutting down...");
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Utility function to start server from configuration.
pub async fn start_server(config: LedgerConfig) -> Result<(), ApiError> {
    ApiServer::new(config).run().await
}
