//! Authentication extractors.
//!
//! Browsing is anonymous. Posting a review needs a customer bearer token
//! issued by the auth service; the token's `sub` becomes the review's user
//! and its `name` the author name shown with it.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use emporium_core::auth::{CurrentUser, TokenError, TokenVerifier};

/// Extractor that requires a signed-in customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn post_review(
///     RequireCustomer(customer): RequireCustomer,
///     Json(input): Json<ReviewInput>,
/// ) -> Result<Json<Review>, AppError> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireCustomer(pub CurrentUser);

/// Error returned when the customer is not signed in.
#[derive(Debug)]
pub enum CustomerAuthRejection {
    MissingToken,
    InvalidToken(TokenError),
}

impl IntoResponse for CustomerAuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "Sign in to continue",
            Self::InvalidToken(TokenError::Expired) => "Session expired, sign in again",
            Self::InvalidToken(e) => {
                tracing::debug!(error = %e, "Rejected customer token");
                "Invalid token"
            }
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
    TokenVerifier: FromRef<S>,
{
    type Rejection = CustomerAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(TokenVerifier::bearer)
            .ok_or(CustomerAuthRejection::MissingToken)?;

        let customer = TokenVerifier::from_ref(state)
            .verify(token)
            .map_err(CustomerAuthRejection::InvalidToken)?;

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(customer.id.to_string()),
                ..Default::default()
            }));
        });
        tracing::Span::current().record("user_id", customer.id.as_i32());

        Ok(Self(customer))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request, routing::post};
    use chrono::Duration;
    use secrecy::SecretString;
    use tower::ServiceExt;

    use emporium_core::{PermissionSet, UserId};

    use super::*;

    const SECRET: &str = "k8#Qz!v2Lr$9wXe@4Tn&7pYb^1Hc*6Md";

    fn verifier(secret: &str) -> TokenVerifier {
        TokenVerifier::new(&SecretString::from(secret), "emporium-auth", "emporium")
    }

    fn customer() -> CurrentUser {
        CurrentUser {
            id: UserId::new(42),
            name: "Lin".into(),
            role: String::new(),
            permissions: PermissionSet::default(),
        }
    }

    async fn whoami(RequireCustomer(customer): RequireCustomer) -> String {
        format!("{}:{}", customer.id, customer.name)
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", post(whoami))
            .with_state(verifier(SECRET))
    }

    fn request(token: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method("POST").uri("/whoami");
        let builder = match token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_yields_customer() {
        let token = verifier(SECRET)
            .sign(&customer(), Duration::minutes(5))
            .unwrap();
        let response = app().oneshot(request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"42:Lin");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_from_other_issuer_key_is_rejected() {
        let token = verifier("Zq7!mB3#xR9@wL2$kT6^pN4&vC8*hF1j")
            .sign(&customer(), Duration::minutes(5))
            .unwrap();
        let response = app().oneshot(request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
