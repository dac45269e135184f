//! Category browsing handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use tracing::instrument;

use emporium_core::catalog::{Category, CategoryNode};

use crate::{error::AppError, services::CategoryPage, state::AppState};

/// Build the categories router.
///
/// Navigation lives outside `/api/categories` so that every slug,
/// `nav` and `tree` included, stays reachable.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/navigation", get(nav))
        .route("/api/navigation/tree", get(tree))
        .route("/api/categories", get(index))
        .route("/api/categories/{slug}", get(show))
        .route("/api/categories/{slug}/products", get(products))
}

pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.catalog().categories().await?))
}

/// Main menu entries.
pub async fn nav(State(state): State<AppState>) -> Result<Json<Arc<Vec<Category>>>, AppError> {
    Ok(Json(state.catalog().nav().await?))
}

pub async fn tree(
    State(state): State<AppState>,
) -> Result<Json<Arc<Vec<CategoryNode>>>, AppError> {
    Ok(Json(state.catalog().tree().await?))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(state.catalog().category(&slug).await?))
}

#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryPage>, AppError> {
    Ok(Json(state.catalog().category_page(&slug).await?))
}
