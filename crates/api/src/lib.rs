//! HTTP surface for LedgerLens.
//!
//! Receives LINE webhook deliveries, imports uploaded ledger exports into the
//! sender's dataset, and serves the dataset to authenticated clients.

#![deny(unsafe_code)]

pub mod audit;
pub mod auth;
pub mod binding;
pub mod config;
pub mod database;
pub mod error;
pub mod replies;
pub mod router;
pub mod server;
pub mod state;
pub mod store;
pub mod transactions;
pub mod webhook;

pub use config::*;
pub use error::*;
pub use router::*;
pub use server::*;
pub use state::AppState;
