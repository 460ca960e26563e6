//! Account lookup and per-account dataset persistence.
//!
//! A dataset is the complete list of canonical records for one account. Every
//! write replaces it as a whole; concurrent writers for the same account race
//! and the last one wins.

use crate::database::Repository;
use futures::future::BoxFuture;
use ledgerlens_core::{AccountId, CanonicalRecord, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves external LINE identities to local accounts.
pub trait AccountDirectory: Send + Sync {
    fn find_by_line_user<'a>(
        &'a self,
        line_user_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<AccountId>>>;

    /// Returns `false` when the account does not exist.
    fn bind_line_user<'a>(
        &'a self,
        account: AccountId,
        line_user_id: &'a str,
    ) -> BoxFuture<'a, Result<bool>>;
}

/// Replace-on-write storage for account datasets.
pub trait DatasetStore: Send + Sync {
    /// Create the dataset or overwrite it completely.
    fn upsert<'a>(
        &'a self,
        account: AccountId,
        records: &'a [CanonicalRecord],
    ) -> BoxFuture<'a, Result<()>>;

    /// Stored records, or an empty list when the account has none.
    fn read(&self, account: AccountId) -> BoxFuture<'_, Result<Vec<CanonicalRecord>>>;
}

fn persistence(err: impl std::fmt::Display) -> Error {
    Error::persistence(err.to_string())
}

impl AccountDirectory for Repository {
    fn find_by_line_user<'a>(
        &'a self,
        line_user_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<AccountId>>> {
        Box::pin(async move {
            let account = self
                .find_account_by_line_user(line_user_id)
                .await
                .map_err(persistence)?;
            Ok(account.map(|a| a.id))
        })
    }

    fn bind_line_user<'a>(
        &'a self,
        account: AccountId,
        line_user_id: &'a str,
    ) -> BoxFuture<'a, Result<bool>> {
        Box::pin(async move {
            Repository::bind_line_user(self, account, line_user_id)
                .await
                .map_err(persistence)
        })
    }
}

/// Datasets stored as a JSON column, one row per account.
#[derive(Clone)]
pub struct SqliteDatasetStore {
    repo: Repository,
}

impl SqliteDatasetStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }
}

impl DatasetStore for SqliteDatasetStore {
    fn upsert<'a>(
        &'a self,
        account: AccountId,
        records: &'a [CanonicalRecord],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let json = serde_json::to_string(records).map_err(persistence)?;
            self.repo
                .upsert_dataset(account, &json)
                .await
                .map_err(persistence)?;
            debug!("stored {} records for account {}", records.len(), account);
            Ok(())
        })
    }

    fn read(&self, account: AccountId) -> BoxFuture<'_, Result<Vec<CanonicalRecord>>> {
        Box::pin(async move {
            let Some(row) = self.repo.get_dataset(account).await.map_err(persistence)? else {
                return Ok(Vec::new());
            };
            serde_json::from_str(&row.records).map_err(persistence)
        })
    }
}

/// Datasets stored as `<root>/transactions/<account>/transactions.json`.
#[derive(Debug, Clone)]
pub struct FileDatasetStore {
    root: PathBuf,
}

impl FileDatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dataset_path(&self, account: AccountId) -> PathBuf {
        self.root
            .join("transactions")
            .join(account.to_string())
            .join("transactions.json")
    }
}

fn replace_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    // Each writer stages its own file and renames it into place, so readers
    // never see a partial file and concurrent writers do not collide.
    let mut staging = tempfile::NamedTempFile::new_in(parent)?;
    staging.write_all(content)?;
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl DatasetStore for FileDatasetStore {
    fn upsert<'a>(
        &'a self,
        account: AccountId,
        records: &'a [CanonicalRecord],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let path = self.dataset_path(account);
            let json = serde_json::to_vec_pretty(records).map_err(persistence)?;
            let target = path.clone();
            tokio::task::spawn_blocking(move || replace_file(&target, &json))
                .await
                .map_err(persistence)?
                .map_err(persistence)?;
            debug!("stored {} records at {}", records.len(), path.display());
            Ok(())
        })
    }

    fn read(&self, account: AccountId) -> BoxFuture<'_, Result<Vec<CanonicalRecord>>> {
        Box::pin(async move {
            let path = self.dataset_path(account);
            match tokio::fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice(&bytes).map_err(persistence),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
                Err(err) => Err(persistence(err)),
            }
        })
    }
}
