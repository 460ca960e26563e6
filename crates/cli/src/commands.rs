//! CLI command definitions for LedgerLens.

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Main CLI application.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Logging verbosity
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "LEDGERLENS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (LINE webhook and dataset API)
    Serve(ServeArgs),

    /// Parse a ledger export and print the canonical records as JSON
    Parse(ParseArgs),
}

/// Server arguments. Anything unset falls back to the configuration file and
/// environment.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// SQLite database path
    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

/// Parse preview arguments.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// CSV export to read; `-` reads standard input
    pub file: PathBuf,

    /// Print compact JSON instead of pretty JSON
    #[arg(long)]
    pub compact: bool,
}
