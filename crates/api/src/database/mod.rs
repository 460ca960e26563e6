use ledgerlens_core::config::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fs;
use tracing::info;

use crate::ApiError;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the SQLite pool and bring the schema up to date.
pub async fn init_database_with_config(config: &DatabaseConfig) -> Result<SqlitePool, ApiError> {
    let db_path = &config.sqlite_path;
    info!("Initializing database at: {:?}", db_path);

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout))
        .connect_with(connect_options)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully with SQLx connection pooling");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), ApiError> {
    info!("Running SQLx database migrations...");
    MIGRATOR
        .run(pool)
        .await
        .map_err(|e| ApiError::Database(format!("migration failed: {}", e)))?;
    info!("Database migrations completed");
    Ok(())
}

pub mod repository;
pub use repository::*;
