//! Shared handler state.

use ledgerlens_core::config::StorageBackend;
use ledgerlens_core::LedgerConfig;
use ledgerlens_line::{
    build_http_client, ChannelSecretVerifier, CredentialCache, HttpTokenExchange,
    IdTokenVerifier, LineClient, LineLogin,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

use crate::audit::{AuditLog, FileAuditLog, TracingAuditLog};
use crate::database::Repository;
use crate::replies::ReplyCatalog;
use crate::store::{AccountDirectory, DatasetStore, FileDatasetStore, SqliteDatasetStore};
use crate::webhook::WebhookConsumer;
use crate::ApiError;

/// Cloned into every handler; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub webhook: Arc<WebhookConsumer>,
    pub login: Arc<dyn IdTokenVerifier>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub datasets: Arc<dyn DatasetStore>,
}

impl AppState {
    /// Wire the production adapters from configuration.
    pub fn from_config(config: &LedgerConfig, pool: SqlitePool) -> Result<Self, ApiError> {
        let repo = Repository::new(Arc::new(pool));
        let http = build_http_client(&config.line)?;

        let datasets: Arc<dyn DatasetStore> = match config.storage.backend {
            StorageBackend::Sqlite => Arc::new(SqliteDatasetStore::new(repo.clone())),
            StorageBackend::File => {
                info!(
                    "storing datasets under {}",
                    config.storage.upload_dir.display()
                );
                Arc::new(FileDatasetStore::new(&config.storage.upload_dir))
            }
        };
        let audit: Arc<dyn AuditLog> = if config.logging.enable_audit_log {
            Arc::new(FileAuditLog::new(&config.logging.audit_log_path))
        } else {
            Arc::new(TracingAuditLog)
        };
        let accounts: Arc<dyn AccountDirectory> = Arc::new(repo);

        let webhook = WebhookConsumer::new(
            Arc::new(ChannelSecretVerifier::new(config.line.channel_secret.clone())),
            Arc::new(CredentialCache::new(HttpTokenExchange::new(
                http.clone(),
                &config.line,
            ))),
            Arc::new(LineClient::new(http.clone(), &config.line)),
            accounts.clone(),
            datasets.clone(),
            audit,
            ReplyCatalog::new(config.line.bind_url.clone()),
        );

        Ok(Self {
            webhook: Arc::new(webhook),
            login: Arc::new(LineLogin::new(http, &config.line)),
            accounts,
            datasets,
        })
    }
}
