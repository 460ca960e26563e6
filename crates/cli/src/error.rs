//! Error types for CLI operations.

use thiserror::Error;

/// Main error type for CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// API server error.
    #[error("API server error: {0}")]
    Api(#[from] ledgerlens_api::ApiError),

    /// Ledger parsing or core error.
    #[error("{0}")]
    Core(#[from] ledgerlens_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
