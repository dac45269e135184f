//! Mint access tokens for local development.
//!
//! Tokens are normally issued by the auth service. This signs one with the
//! same `AUTH_JWT_*` settings the servers verify against, so the APIs can
//! be exercised with curl.
//!
//! # Usage
//!
//! ```bash
//! emporium token --user-id 1 --name "Grace" --role "Super Admin" --grant all
//! emporium token --user-id 42 --name "Lin" --minutes 120
//! ```

use chrono::Duration;

use emporium_core::auth::{CurrentUser, TokenError};
use emporium_core::config::{AuthConfig, ConfigError};
use emporium_core::{PermissionSet, UserId};

#[derive(Debug, thiserror::Error)]
pub enum TokenCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Sign a token and print it to stdout.
///
/// # Errors
///
/// Returns an error if the signing secret is missing or too weak.
pub fn issue(
    user_id: i32,
    name: &str,
    role: &str,
    grants: &[String],
    minutes: i64,
) -> Result<(), TokenCommandError> {
    dotenvy::dotenv().ok();
    let verifier = AuthConfig::from_env()?.verifier();

    let user = CurrentUser {
        id: UserId::new(user_id),
        name: name.to_owned(),
        role: role.to_owned(),
        permissions: PermissionSet::from_grants(grants.iter().map(String::as_str)),
    };
    let token = verifier.sign(&user, Duration::minutes(minutes))?;

    tracing::info!(user_id, minutes, grants = grants.len(), "Token issued");

    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
