//! Core types, errors, and configuration for LedgerLens.
//!
//! This crate holds the pieces shared by the HTTP surface and the CLI: the
//! canonical ledger record model, the tabular ingestion parser that maps
//! localized spreadsheet exports onto it, and the layered configuration.

pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod types;

// Re-exports for convenience
pub use config::LedgerConfig;
pub use error::{Error, Result};
pub use ingest::parse_ledger;
pub use types::*;
