//! Configuration for the LedgerLens HTTP API server.

use ledgerlens_core::LedgerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Socket address to bind to.
    pub bind_addr: SocketAddr,

    /// API base path (e.g., "/api").
    pub api_base_path: String,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Enable request logging.
    pub enable_request_logging: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_ledger_config(&LedgerConfig::default())
    }
}

impl ApiConfig {
    /// Create API configuration from the application configuration.
    pub fn from_ledger_config(config: &LedgerConfig) -> Self {
        let bind_addr = format!("{}:{}", config.http.host, config.http.port)
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], config.http.port)));

        Self {
            bind_addr,
            api_base_path: normalize_base_path(&config.http.api_base_path),
            request_timeout_seconds: config.http.request_timeout,
            enable_request_logging: config.http.enable_request_logging,
            max_body_size: config.http.max_body_size,
        }
    }
}

// Leading slash, no trailing slash; empty stays empty (routes at root).
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
