//! Category management handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use emporium_core::catalog::{Category, CategoryInput};
use emporium_core::{CatalogError, CategoryId, Permission};

use crate::{
    error::AppError,
    middleware::{RequireAdmin, require_permission},
    state::AppState,
};

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(index).post(create))
        .route(
            "/api/categories/{id}",
            get(show).put(update).delete(destroy),
        )
}

/// List every category, ordered by name.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    require_permission(&admin, Permission::CategoriesView)?;
    Ok(Json(state.categories().list().await?))
}

#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>, AppError> {
    require_permission(&admin, Permission::CategoriesView)?;
    let category = state
        .categories()
        .get(id)
        .await?
        .ok_or(CatalogError::CategoryNotFound(id))?;
    Ok(Json(category))
}

#[instrument(skip(admin, state, input), fields(name = %input.name))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    require_permission(&admin, Permission::CategoriesCreate)?;
    let category = state.categories().create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(admin, state, input), fields(name = %input.name))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>, AppError> {
    require_permission(&admin, Permission::CategoriesEdit)?;
    Ok(Json(state.categories().update(id, input).await?))
}

#[instrument(skip(admin, state))]
pub async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode, AppError> {
    require_permission(&admin, Permission::CategoriesDelete)?;
    state.categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
