//! Environment configuration shared by the Emporium binaries.
//!
//! Each binary owns its own config struct; this module holds the pieces they
//! have in common: environment lookups, secret validation and the access
//! token settings.
//!
//! # Environment Variables
//!
//! - `AUTH_JWT_SECRET` - HS256 signing secret shared with the auth service (required)
//! - `AUTH_JWT_ISSUER` - Expected `iss` claim (default: emporium-auth)
//! - `AUTH_JWT_AUDIENCE` - Expected `aud` claim (default: emporium)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::auth::TokenVerifier;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

pub const DEFAULT_JWT_ISSUER: &str = "emporium-auth";
pub const DEFAULT_JWT_AUDIENCE: &str = "emporium";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Access token settings.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub issuer: String,
    pub audience: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

impl AuthConfig {
    /// Load `AUTH_JWT_*` from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the secret is missing, too short, or looks
    /// like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = get_validated_secret("AUTH_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "AUTH_JWT_SECRET")?;

        Ok(Self {
            jwt_secret,
            issuer: get_env_or_default("AUTH_JWT_ISSUER", DEFAULT_JWT_ISSUER),
            audience: get_env_or_default("AUTH_JWT_AUDIENCE", DEFAULT_JWT_AUDIENCE),
        })
    }

    /// Build the verifier for these settings.
    #[must_use]
    pub fn verifier(&self) -> TokenVerifier {
        TokenVerifier::new(&self.jwt_secret, &self.issuer, &self.audience)
    }
}

/// Sentry settings. All optional; no DSN means Sentry stays off.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    /// e.g. "development", "staging", "production"
    pub environment: Option<String>,
    /// Error sample rate (0.0 to 1.0)
    pub sample_rate: f32,
    /// Traces sample rate for performance monitoring (0.0 to 1.0)
    pub traces_sample_rate: f32,
}

impl SentryConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        }
    }
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 1.0,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if it is not set.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` if neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the value does not parse.
pub fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholders and low-entropy values.
///
/// # Errors
///
/// Returns `ConfigError::InsecureSecret` describing the problem.
pub fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
///
/// # Errors
///
/// Returns `ConfigError` if the variable is missing or fails
/// [`validate_secret_strength`].
pub fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_uniform() {
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("abab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_is_rejected() {
        for value in ["your-jwt-key-here", "changeme123", "MY_SECRET_TOKEN_42"] {
            let err = validate_secret_strength(value, "AUTH_JWT_SECRET").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)), "{value}");
        }
    }

    #[test]
    fn test_low_entropy_is_rejected() {
        let err = validate_secret_strength(&"ab".repeat(20), "AUTH_JWT_SECRET").unwrap_err();
        assert!(err.to_string().contains("entropy too low"));
    }

    #[test]
    fn test_random_secret_is_accepted() {
        assert!(validate_secret_strength("k8#Qz!v2Lr$9wXe@4Tn&7pYb^1Hc*6Md", "AUTH_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let secret = SecretString::from("k8#Qz!v2Lr$9");
        assert!(validate_secret_length(&secret, "AUTH_JWT_SECRET").is_err());
        let secret = SecretString::from("k8#Qz!v2Lr$9wXe@4Tn&7pYb^1Hc*6Md");
        assert!(validate_secret_length(&secret, "AUTH_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_auth_config_debug_redacts_secret() {
        let config = AuthConfig {
            jwt_secret: SecretString::from("k8#Qz!v2Lr$9wXe@4Tn&7pYb^1Hc*6Md"),
            issuer: DEFAULT_JWT_ISSUER.to_string(),
            audience: DEFAULT_JWT_AUDIENCE.to_string(),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("emporium-auth"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k8#Qz"));
    }
}
