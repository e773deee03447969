//! Database operations for the ranking SQLite database.
//!
//! ## Tables
//!
//! - `ambassador` - Salespeople, their totals and coupon codes
//! - `administrator` - Accounts that manage ambassadors
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and embedded at build
//! time. The server runs them on startup, and so does:
//! ```bash
//! cargo run -p ranking-cli -- migrate
//! ```

pub mod administrators;
pub mod ambassadors;
pub mod legacy;

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use administrators::AdministratorRepository;
pub use ambassadors::AmbassadorRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique national ID).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a SQLite connection pool.
///
/// The database file (and its parent directory) is created if missing.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the URL is invalid or the
/// connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, RepositoryError> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true);

    if let Some(parent) = options.get_filename().parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RepositoryError::Database(sqlx::Error::Io(e)))?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Open a private in-memory database with migrations applied.
///
/// A single connection that never expires, so every query sees the same
/// database.
///
/// # Errors
///
/// Returns `RepositoryError` if the database cannot be opened or migrated.
pub async fn connect_in_memory() -> Result<SqlitePool, RepositoryError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Run the embedded migrations, then upgrade any legacy schema.
///
/// # Errors
///
/// Returns `RepositoryError` if a migration or the legacy upgrade fails.
pub async fn migrate(pool: &SqlitePool) -> Result<(), RepositoryError> {
    MIGRATOR.run(pool).await?;
    let report = legacy::upgrade(pool).await?;
    if report.found_legacy_table {
        tracing::info!(
            copied = report.copied,
            skipped = report.skipped,
            kept = report.unrecoverable,
            "Upgraded legacy user table"
        );
    }
    Ok(())
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Parse a decimal stored as TEXT.
pub(crate) fn parse_decimal(raw: &str, column: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} {raw:?}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let pool = connect_in_memory().await.unwrap();
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('ambassador', 'administrator') ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(tables, ["administrator", "ambassador"]);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = connect_in_memory().await.unwrap();
        migrate(&pool).await.unwrap();
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1234.50", "total_sales").unwrap(), Decimal::new(123_450, 2));
        assert_eq!(parse_decimal("1e3", "goal").unwrap(), Decimal::new(1000, 0));
        assert!(matches!(
            parse_decimal("lots", "goal"),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
