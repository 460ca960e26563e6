//! Error types for LINE platform calls.

use thiserror::Error;

/// Error raised by the LINE adapter.
#[derive(Error, Debug)]
pub enum LineError {
    /// Required channel credentials are not configured.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The platform answered with a non-success status.
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Message content could not be downloaded.
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Webhook signature or ID token was rejected.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias for LINE adapter operations.
pub type LineResult<T> = Result<T, LineError>;

impl From<reqwest::Error> for LineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LineError::Decode(err.to_string())
        } else {
            LineError::Transport(err.to_string())
        }
    }
}
