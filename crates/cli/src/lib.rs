//! Command-line interface for LedgerLens.
//!
//! Runs the HTTP server and previews ledger exports locally.

#![deny(missing_docs, unsafe_code)]

/// CLI command definitions and parsing.
pub mod commands;

/// CLI application entry point and configuration.
pub mod app;

/// Error types for CLI operations.
pub mod error;
