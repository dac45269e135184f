//! Database connection for the storefront.
//!
//! The storefront reads the catalog tables and writes only reviews. Queries
//! live in `emporium_core::catalog::postgres` and `emporium_core::content`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/core/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
