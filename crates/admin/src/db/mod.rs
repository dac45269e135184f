//! Database operations for the admin API.
//!
//! Catalog and content tables are reached through the stores in
//! `emporium_core`; the repositories here cover what only the back office
//! touches.
//!
//! ## Tables
//!
//! - `role` - Staff roles and their permissions
//! - `category`, `product`, `review` - Read for dashboard counts
//!
//! # Migrations
//!
//! Migrations are stored in `crates/core/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

pub mod dashboard;
pub mod roles;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use dashboard::{DashboardStats, dashboard_stats};
pub use roles::RoleRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique role name).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Turn unique violations into `Conflict`, leave everything else as is.
    fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            _ => Self::Database(err),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
