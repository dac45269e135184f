//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `AUTH_JWT_SECRET` - Access token signing secret, shared with the auth service
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 0.0.0.0)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CACHE_TTL_SECS` - Navigation cache lifetime (default: 300)
//! - `AUTH_JWT_ISSUER`, `AUTH_JWT_AUDIENCE` - Expected token claims
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;

use emporium_core::config::{
    AuthConfig, ConfigError, SentryConfig, get_database_url, parse_env_or_default,
};

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// How long the category navigation and tree stay cached.
    pub cache_ttl: Duration,
    pub auth: AuthConfig,
    pub sentry: SentryConfig,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let cache_ttl_secs: u64 = parse_env_or_default("STOREFRONT_CACHE_TTL_SECS", "300")?;

        Ok(Self {
            database_url: get_database_url("STOREFRONT_DATABASE_URL")?,
            host: parse_env_or_default("STOREFRONT_HOST", "0.0.0.0")?,
            port: parse_env_or_default("STOREFRONT_PORT", "3000")?,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            auth: AuthConfig::from_env()?,
            sentry: SentryConfig::from_env(),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
