//! Raw request audit sink.
//!
//! Webhook bodies can only be read once, so they are captured here before
//! signature verification consumes them.

use futures::future::BoxFuture;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Destination for raw request bodies. Failures are logged, never surfaced.
pub trait AuditLog: Send + Sync {
    fn record<'a>(&'a self, label: &'a str, body: &'a [u8]) -> BoxFuture<'a, ()>;
}

/// Appends timestamped entries to a plain text file.
#[derive(Debug, Clone)]
pub struct FileAuditLog {
    path: PathBuf,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn format_entry(label: &str, body: &[u8]) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        format!(
            "[{}] {}:\n{}\n\n------------------------------------------------\n\n",
            timestamp,
            label,
            String::from_utf8_lossy(body)
        )
    }
}

fn append_entry(path: &PathBuf, entry: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(entry.as_bytes())
}

impl AuditLog for FileAuditLog {
    fn record<'a>(&'a self, label: &'a str, body: &'a [u8]) -> BoxFuture<'a, ()> {
        let entry = Self::format_entry(label, body);
        let path = self.path.clone();
        Box::pin(async move {
            let result = tokio::task::spawn_blocking(move || append_entry(&path, &entry)).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("failed to write audit log {}: {}", self.path.display(), err),
                Err(err) => warn!("audit log task failed: {}", err),
            }
        })
    }
}

/// Sends bodies to the tracing pipeline at debug level.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn record<'a>(&'a self, label: &'a str, body: &'a [u8]) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            debug!(target: "ledgerlens::audit", "{}: {}", label, String::from_utf8_lossy(body));
        })
    }
}
