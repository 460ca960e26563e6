//! Error types for LedgerLens core functionality.

use thiserror::Error;

/// Main error type for LedgerLens.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Tabular input could not be read as a ledger export.
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data parsing error: {0}")]
    Parse(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for LedgerLens operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a malformed input error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Human-readable detail without the category prefix.
    ///
    /// Used where the message is embedded in a reply that already names the
    /// failure.
    pub fn detail(&self) -> String {
        match self {
            Error::Config(msg)
            | Error::MalformedInput(msg)
            | Error::Persistence(msg)
            | Error::Parse(msg)
            | Error::Internal(msg) => msg.clone(),
            Error::Io(err) => err.to_string(),
        }
    }
}
