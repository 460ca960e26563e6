use crate::constants::{
    DEFAULT_API_BASE_PATH, DEFAULT_AUDIT_LOG_PATH, DEFAULT_DB_POOL_SIZE, DEFAULT_HTTP_PORT,
    DEFAULT_LINE_API_BASE_URL, DEFAULT_LINE_BIND_URL, DEFAULT_LINE_DATA_API_BASE_URL,
    DEFAULT_UPLOAD_DIR, MAX_BODY_SIZE,
};
use crate::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for LedgerLens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// HTTP server configuration.
    pub http: HttpConfig,

    /// Database configuration.
    pub database: DatabaseConfig,

    /// LINE channel configuration.
    pub line: LineConfig,

    /// Dataset storage configuration.
    pub storage: StorageConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// API base path.
    pub api_base_path: String,

    /// Request timeout in seconds.
    pub request_timeout: u64,

    /// Enable request logging.
    pub enable_request_logging: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    pub sqlite_path: PathBuf,

    /// Maximum number of connections in pool.
    pub max_connections: u32,

    /// Connection timeout in seconds.
    pub connection_timeout: u64,
}

/// LINE Messaging and Login channel configuration.
///
/// Credentials are optional here; the call that needs one reports a
/// configuration error when it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Messaging API channel id used for the client-credentials exchange.
    pub messaging_channel_id: Option<String>,

    /// Channel secret: exchange credential and webhook signing key.
    pub channel_secret: Option<String>,

    /// LINE Login channel id used when verifying ID tokens.
    pub login_channel_id: Option<String>,

    /// Base URL of the platform API.
    pub api_base_url: String,

    /// Base URL of the content API.
    pub data_api_base_url: String,

    /// Page where users link their LINE identity to an account.
    pub bind_url: String,

    /// Timeout for outbound LINE calls in seconds.
    pub request_timeout_seconds: u64,
}

/// Where datasets are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON column per account in SQLite.
    Sqlite,

    /// One JSON file per account under the upload directory.
    File,
}

/// Dataset storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Active backend.
    pub backend: StorageBackend,

    /// Root directory for the file backend.
    pub upload_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,

    /// Append raw webhook bodies to the audit log.
    pub enable_audit_log: bool,

    /// Audit log file.
    pub audit_log_path: PathBuf,
}

impl LedgerConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content).map_err(|e| Error::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Parse(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from an optional file, then layer the process environment on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from environment-style lookups.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(port) = get("PORT").and_then(|v| v.parse().ok()) {
            self.http.port = port;
        }
        if let Some(path) = get("LEDGERLENS_DB_PATH") {
            self.database.sqlite_path = PathBuf::from(path);
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            self.storage.upload_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("LOG_FILE_PATH") {
            self.logging.audit_log_path = PathBuf::from(path);
        }
        if let Some(id) = get("LINE_MESSAGING_CHANNEL_ID") {
            self.line.messaging_channel_id = Some(id);
        }
        if let Some(secret) = get("LINE_CHANNEL_SECRET") {
            self.line.channel_secret = Some(secret);
        }
        if let Some(id) = get("LINE_LOGIN_CHANNEL_ID") {
            self.line.login_channel_id = Some(id);
        }
        if let Some(url) = get("LINE_BIND_URL") {
            self.line.bind_url = url;
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_HTTP_PORT,
            api_base_path: DEFAULT_API_BASE_PATH.to_string(),
            request_timeout: 30,
            enable_request_logging: true,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("ledgerlens.db"),
            max_connections: DEFAULT_DB_POOL_SIZE,
            connection_timeout: 10,
        }
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            messaging_channel_id: None,
            channel_secret: None,
            login_channel_id: None,
            api_base_url: DEFAULT_LINE_API_BASE_URL.to_string(),
            data_api_base_url: DEFAULT_LINE_DATA_API_BASE_URL.to_string(),
            bind_url: DEFAULT_LINE_BIND_URL.to_string(),
            request_timeout_seconds: 15,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_audit_log: true,
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG_PATH),
        }
    }
}
