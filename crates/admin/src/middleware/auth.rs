//! Authentication extractors for admin.
//!
//! Every `/api` handler takes a [`RequireAdmin`] and then checks the
//! permission it needs with [`require_permission`].

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use emporium_core::Permission;
use emporium_core::auth::{CurrentUser, TokenError, TokenVerifier};

use crate::error::{AppError, set_sentry_user};

/// Extractor that requires a valid staff bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> Result<Json<Vec<Role>>, AppError> {
///     require_permission(&admin, Permission::RolesView)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when the bearer token is missing or rejected.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// The token failed verification.
    InvalidToken(TokenError),
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::MissingToken => "Missing bearer token".to_string(),
            Self::InvalidToken(TokenError::Expired) => "Token expired".to_string(),
            Self::InvalidToken(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                "Invalid token".to_string()
            }
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    TokenVerifier: FromRef<S>,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(TokenVerifier::bearer)
            .ok_or(AdminAuthRejection::MissingToken)?;

        let admin = TokenVerifier::from_ref(state)
            .verify(token)
            .map_err(AdminAuthRejection::InvalidToken)?;

        set_sentry_user(admin.id.as_i32(), &admin.name);
        Ok(Self(admin))
    }
}

/// Check that `admin` holds `permission`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` naming the missing permission.
pub fn require_permission(admin: &CurrentUser, permission: Permission) -> Result<(), AppError> {
    if admin.can(permission) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %admin.id,
            permission = %permission,
            "Permission denied"
        );
        Err(AppError::Forbidden(format!("missing permission {permission}")))
    }
}
