//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use emporium_core::{CatalogError, StoreError};

use crate::db::RepositoryError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A catalog rule rejected the request, or its store failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but lacking a permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Catalog(err.into())
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(err) => catalog_status(err),
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// HTTP status for a catalog error. A parent that does not exist is a bad
/// field in the request body (422); anything else missing is 404.
pub const fn catalog_status(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::SlugConflict(_)
        | CatalogError::AlreadyReviewed
        | CatalogError::Conflict(_)
        | CatalogError::CycleDetected { .. }
        | CatalogError::HasChildren(_)
        | CatalogError::InUse(_) => StatusCode::CONFLICT,
        CatalogError::ParentNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::CategoryNotFound(_)
        | CatalogError::ProductNotFound(_)
        | CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: i32, name: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(name.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use emporium_core::{CategoryId, ProductId};

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("banner 3".to_string());
        assert_eq!(err.to_string(), "Not found: banner 3");

        let err = AppError::Catalog(CatalogError::validation("Category name is required."));
        assert_eq!(err.to_string(), "Category name is required.");
    }

    #[test]
    fn test_catalog_error_status_codes() {
        assert_eq!(
            get_status(CatalogError::validation("bad").into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CatalogError::AlreadyReviewed.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CatalogError::HasChildren(CategoryId::new(1)).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                CatalogError::CycleDetected {
                    category: CategoryId::new(1),
                    parent: CategoryId::new(2),
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CatalogError::ParentNotFound(CategoryId::new(9)).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(CatalogError::ProductNotFound(ProductId::new(9)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(StoreError::DataCorruption("bad".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("role_name_key".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response = AppError::Internal("connection refused on 10.0.0.3".into()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap_or_default();
        assert_eq!(body["error"], "Internal server error");
    }
}
