//! Application constants and configuration defaults.

/// Default HTTP server port.
pub const DEFAULT_HTTP_PORT: u16 = 9000;

/// Default API base path.
pub const DEFAULT_API_BASE_PATH: &str = "/api";

/// Maximum accepted request body (10 MB).
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Default database connection pool size.
pub const DEFAULT_DB_POOL_SIZE: u32 = 5;

/// Default directory for file-backed datasets.
pub const DEFAULT_UPLOAD_DIR: &str = "./uploads";

/// Default path of the raw request audit log.
pub const DEFAULT_AUDIT_LOG_PATH: &str = "app.log";

/// Remaining lifetime below which a cached channel token is refreshed (5 minutes).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Default LINE platform API host.
pub const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";

/// Default LINE content API host.
pub const DEFAULT_LINE_DATA_API_BASE_URL: &str = "https://api-data.line.me";

/// Default page users are sent to when their LINE identity is not linked yet.
pub const DEFAULT_LINE_BIND_URL: &str = "http://localhost:4200/line-bind";
