//! Product management handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use emporium_core::catalog::{Product, ProductFilter, ProductInput, Review};
use emporium_core::{CatalogError, Permission, ProductId};

use crate::{
    error::AppError,
    middleware::{RequireAdmin, require_permission},
    state::AppState,
};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(index).post(create))
        .route(
            "/api/products/{id}",
            get(show).put(update).delete(destroy),
        )
        .route("/api/products/{id}/reviews", get(reviews))
}

/// List products, newest first. Takes the same filters as the storefront
/// listing; inactive products are included unless `active_only` is set.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    require_permission(&admin, Permission::ProductsView)?;
    Ok(Json(state.products().list(&filter).await?))
}

#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, AppError> {
    require_permission(&admin, Permission::ProductsView)?;
    let product = state
        .products()
        .get(id)
        .await?
        .ok_or(CatalogError::ProductNotFound(id))?;
    Ok(Json(product))
}

#[instrument(skip(admin, state, input), fields(name = %input.name))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    require_permission(&admin, Permission::ProductsCreate)?;
    let product = state.products().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(admin, state, input), fields(name = %input.name))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>, AppError> {
    require_permission(&admin, Permission::ProductsEdit)?;
    Ok(Json(state.products().update(id, input).await?))
}

#[instrument(skip(admin, state))]
pub async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    require_permission(&admin, Permission::ProductsDelete)?;
    state.products().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every review of a product, newest first.
#[instrument(skip(admin, state))]
pub async fn reviews(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Review>>, AppError> {
    require_permission(&admin, Permission::ReviewsView)?;
    if state.products().get(id).await?.is_none() {
        return Err(CatalogError::ProductNotFound(id).into());
    }
    Ok(Json(state.reviews().list_for_product(id).await?))
}
