//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! ranking-cli migrate
//! ```
//!
//! Applies the embedded migrations and, when an old `user` table is present,
//! copies its ambassadors into the current schema before dropping it. The
//! server does the same on startup, so this is only needed to upgrade a
//! database ahead of a deploy.

use ranking_web::db::{self, RepositoryError};

/// Run all migrations against the configured database.
///
/// # Errors
///
/// Returns `RepositoryError` if the database cannot be opened or a migration
/// fails.
pub async fn run() -> Result<(), RepositoryError> {
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&super::database_url()).await?;

    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
