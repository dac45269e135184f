//! Bearer token verification.
//!
//! Access tokens are issued by the external auth service as HS256 JWTs. Both
//! binaries verify them with the shared secret and turn the claims into a
//! [`CurrentUser`].

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Permission, PermissionSet, UserId};

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Display name.
    pub name: String,
    /// Role name, informational only; authorization uses `permissions`.
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// Token verification failures.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("malformed claims: {0}")]
    MalformedClaims(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub role: String,
    pub permissions: PermissionSet,
}

impl CurrentUser {
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| TokenError::MalformedClaims(format!("subject '{}' is not a user id", claims.sub)))?;

        Ok(Self {
            id,
            name: claims.name,
            role: claims.role,
            permissions: PermissionSet::from_grants(claims.permissions),
        })
    }
}

/// Verifies (and, for tooling, signs) HS256 access tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    issuer: String,
    audience: String,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenVerifier {
    #[must_use]
    pub fn new(secret: &SecretString, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            decoding_key: DecodingKey::from_secret(bytes),
            encoding_key: EncodingKey::from_secret(bytes),
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Strip the `Bearer ` prefix from an `Authorization` header value.
    #[must_use]
    pub fn bearer(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Validate signature, expiry, issuer and audience.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` describing why the token was rejected.
    pub fn verify(&self, token: &str) -> Result<CurrentUser, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        data.claims.try_into()
    }

    /// Sign a token for `user`, valid for `ttl`. Used by tests and local
    /// tooling; production tokens come from the auth service.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn sign(&self, user: &CurrentUser, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role: user.role.clone(),
            permissions: user.permissions.iter().map(str::to_owned).collect(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(
            &SecretString::from("k8#Qz!v2Lr$9wXe@4Tn&7pYb^1Hc*6Md"),
            "emporium-auth",
            "emporium",
        )
    }

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            name: "Ada".into(),
            role: "Product Manager".into(),
            permissions: PermissionSet::from_grants(["products:*", "dashboard:view"]),
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let v = verifier();
        let token = v.sign(&user(), Duration::minutes(5)).unwrap();
        let current = v.verify(&token).unwrap();
        assert_eq!(current, user());
        assert!(current.can(Permission::ProductsDelete));
        assert!(!current.can(Permission::RolesEdit));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let v = verifier();
        let token = v.sign(&user(), Duration::minutes(-10)).unwrap();
        assert!(matches!(v.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = verifier().sign(&user(), Duration::minutes(5)).unwrap();
        let other = TokenVerifier::new(
            &SecretString::from("Zr4!mQ8@xL2#vT6$nB9%kW1^pF5&hJ3*"),
            "emporium-auth",
            "emporium",
        );
        assert!(matches!(other.verify(&token), Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let token = verifier().sign(&user(), Duration::minutes(5)).unwrap();
        let other = TokenVerifier::new(
            &SecretString::from("k8#Qz!v2Lr$9wXe@4Tn&7pYb^1Hc*6Md"),
            "emporium-auth",
            "someone-else",
        );
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_bearer_prefix() {
        assert_eq!(TokenVerifier::bearer("Bearer abc"), Some("abc"));
        assert_eq!(TokenVerifier::bearer("Basic abc"), None);
        assert_eq!(TokenVerifier::bearer("Bearer "), None);
    }
}
