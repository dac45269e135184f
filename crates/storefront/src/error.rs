//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use emporium_core::{CatalogError, StoreError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A catalog rule rejected the request, or its store failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

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
            Self::Catalog(err) => match err {
                CatalogError::Validation(_) | CatalogError::ParentNotFound(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                CatalogError::SlugConflict(_)
                | CatalogError::AlreadyReviewed
                | CatalogError::Conflict(_)
                | CatalogError::CycleDetected { .. }
                | CatalogError::HasChildren(_)
                | CatalogError::InUse(_) => StatusCode::CONFLICT,
                CatalogError::CategoryNotFound(_)
                | CatalogError::ProductNotFound(_)
                | CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
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
