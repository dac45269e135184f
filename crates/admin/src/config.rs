//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `AUTH_JWT_SECRET` - Access token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `AUTH_JWT_ISSUER` - Expected token issuer (default: emporium-auth)
//! - `AUTH_JWT_AUDIENCE` - Expected token audience (default: emporium)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;

use emporium_core::config::{
    AuthConfig, ConfigError, SentryConfig, get_database_url, get_optional_env,
    parse_env_or_default,
};

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Access token verification settings
    pub auth: AuthConfig,
    pub sentry: SentryConfig,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (get_optional_env("ADMIN_TLS_CERT"), get_optional_env("ADMIN_TLS_KEY")) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("ADMIN_DATABASE_URL")?,
            host: parse_env_or_default("ADMIN_HOST", "127.0.0.1")?,
            port: parse_env_or_default("ADMIN_PORT", "3001")?,
            auth: AuthConfig::from_env()?,
            sentry: SentryConfig::from_env(),
            tls: TlsConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
