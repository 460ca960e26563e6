//! CLI application entry point and configuration.
//!
//! Loads [`LedgerConfig`] from the optional configuration file and the
//! environment, applies command-line overrides, and dispatches the command.

use crate::commands::{Cli, Commands, ParseArgs, ServeArgs};
use crate::error::{CliError, Result};
use clap::Parser;
use ledgerlens_core::{parse_ledger, LedgerConfig};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Main CLI application.
#[derive(Debug)]
pub struct App {
    /// Resolved application configuration.
    pub config: LedgerConfig,
    /// Parsed CLI arguments.
    pub cli: Cli,
}

impl App {
    /// Create a new application instance from command line arguments.
    pub fn new() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    /// Create an application instance from already parsed arguments.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let config = Self::load_config(&cli)?;
        Ok(Self { config, cli })
    }

    /// Load configuration from file and environment.
    fn load_config(cli: &Cli) -> Result<LedgerConfig> {
        if let Some(path) = &cli.config {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(LedgerConfig::resolve(cli.config.as_deref())?)
    }

    /// Run the application.
    pub fn run(self) -> Result<()> {
        self.setup_logging();

        match &self.cli.command {
            Commands::Serve(args) => self.handle_serve(args),
            Commands::Parse(args) => handle_parse(args),
        }
    }

    /// Set up logging. `RUST_LOG` wins over `-v`; without either the
    /// configured level applies.
    fn setup_logging(&self) {
        let default_directive = match self.cli.verbose {
            0 => self.config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .ok(); // Ignore errors if a subscriber is already installed
    }

    fn handle_serve(&self, args: &ServeArgs) -> Result<()> {
        let config = apply_serve_overrides(self.config.clone(), args);
        info!(
            "serving on {}:{} with database {}",
            config.http.host,
            config.http.port,
            config.database.sqlite_path.display()
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Internal(e.to_string()))?;

        runtime.block_on(ledgerlens_api::start_server(config))?;
        Ok(())
    }
}

fn apply_serve_overrides(mut config: LedgerConfig, args: &ServeArgs) -> LedgerConfig {
    if let Some(host) = args.host {
        config.http.host = host.to_string();
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(path) = &args.db_path {
        config.database.sqlite_path = path.clone();
    }
    config
}

fn handle_parse(args: &ParseArgs) -> Result<()> {
    let json = render_parse(&args.file, args.compact)?;
    println!("{}", json);
    Ok(())
}

fn render_parse(path: &Path, compact: bool) -> Result<String> {
    let reader: Box<dyn Read> = if path == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(path)?))
    };

    let records = parse_ledger(reader)?;
    let rendered = if compact {
        serde_json::to_string(&records)
    } else {
        serde_json::to_string_pretty(&records)
    };
    rendered.map_err(|e| CliError::Internal(e.to_string()))
}

/// Parse command line arguments and run the application.
pub fn run() -> Result<()> {
    let app = App::new()?;
    app.run()
}
