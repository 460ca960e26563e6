//! Error types for the LedgerLens HTTP API server.

use axum::response::IntoResponse;
use ledgerlens_line::LineError;
use thiserror::Error;

/// Main error type for API operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP server error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Authentication/authorization error.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Core LedgerLens error.
    #[error("Core error: {0}")]
    Core(#[from] ledgerlens_core::Error),

    /// LINE platform error.
    #[error("LINE error: {0}")]
    Line(#[from] LineError),
}

/// Result alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl ApiError {
    /// Convert to HTTP status code.
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Http(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Core(ledgerlens_core::Error::MalformedInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Line(LineError::Authentication(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Line(LineError::Upstream { .. } | LineError::Transfer(_)) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Line(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApiError> for axum::response::Response {
    fn from(error: ApiError) -> Self {
        let status = error.status_code();
        let body = serde_json::json!({
            "error": error.to_string(),
            "code": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        self.into()
    }
}
