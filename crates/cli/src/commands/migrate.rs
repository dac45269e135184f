//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! emporium migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migrations live in `crates/core/migrations/` and are embedded at build
//! time. The servers never migrate on start.

use emporium_admin::db;
use emporium_core::config::{ConfigError, get_database_url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../core/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
