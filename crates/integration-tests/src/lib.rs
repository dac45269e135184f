//! Integration tests for Emporium.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no services needed)
//! cargo test -p emporium-integration-tests
//!
//! # HTTP tests against running servers
//! emporium migrate
//! cargo run -p emporium-admin &
//! cargo run -p emporium-storefront &
//! cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `catalog_flow` - Admin writes seen through the storefront service, in memory
//! - `storefront_api` - Storefront HTTP API
//! - `admin_api` - Admin HTTP API

use chrono::Duration;
use reqwest::Client;
use secrecy::SecretString;

use emporium_core::auth::{CurrentUser, TokenVerifier};
use emporium_core::{PermissionSet, UserId};

/// Base URL for the storefront API (configurable via environment).
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL for the admin API (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Verifier built from the same `AUTH_JWT_*` variables the servers read.
///
/// # Panics
///
/// Panics if `AUTH_JWT_SECRET` is not set.
#[must_use]
#[allow(clippy::expect_used)]
pub fn verifier() -> TokenVerifier {
    let secret = std::env::var("AUTH_JWT_SECRET").expect("AUTH_JWT_SECRET must be set");
    let issuer =
        std::env::var("AUTH_JWT_ISSUER").unwrap_or_else(|_| "emporium-auth".to_string());
    let audience = std::env::var("AUTH_JWT_AUDIENCE").unwrap_or_else(|_| "emporium".to_string());
    TokenVerifier::new(&SecretString::from(secret), issuer, audience)
}

/// Sign a short-lived token carrying `grants`.
///
/// # Panics
///
/// Panics if the token cannot be signed.
#[must_use]
#[allow(clippy::expect_used)]
pub fn token(user_id: i32, name: &str, grants: &[&str]) -> String {
    let user = CurrentUser {
        id: UserId::new(user_id),
        name: name.to_owned(),
        role: String::new(),
        permissions: PermissionSet::from_grants(grants.iter().copied()),
    };
    verifier()
        .sign(&user, Duration::minutes(10))
        .expect("Failed to sign test token")
}

/// Plain HTTP client for the API tests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}
