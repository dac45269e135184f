//! Homepage banner handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use tracing::instrument;

use emporium_core::content::{Banner, BannerInput};
use emporium_core::{BannerId, Permission};

use crate::{
    error::AppError,
    middleware::{RequireAdmin, require_permission},
    state::AppState,
};

/// Build the banners router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/banners", get(index).post(create))
        .route("/api/banners/{id}", put(update).delete(destroy))
}

/// All banners, including switched-off ones, in display order.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Banner>>, AppError> {
    require_permission(&admin, Permission::MarketingView)?;
    Ok(Json(state.content().list_banners(false).await?))
}

#[instrument(skip(admin, state, input), fields(title = %input.title))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<BannerInput>,
) -> Result<(StatusCode, Json<Banner>), AppError> {
    require_permission(&admin, Permission::MarketingEdit)?;
    let input = input.normalized()?;
    let banner = state.content().create_banner(&input).await?;
    tracing::info!(banner_id = %banner.id, "Banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

#[instrument(skip(admin, state, input), fields(title = %input.title))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
    Json(input): Json<BannerInput>,
) -> Result<Json<Banner>, AppError> {
    require_permission(&admin, Permission::MarketingEdit)?;
    let input = input.normalized()?;
    let banner = state
        .content()
        .update_banner(id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("banner {id}")))?;
    Ok(Json(banner))
}

#[instrument(skip(admin, state))]
pub async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
) -> Result<StatusCode, AppError> {
    require_permission(&admin, Permission::MarketingEdit)?;
    if !state.content().delete_banner(id).await? {
        return Err(AppError::NotFound(format!("banner {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}
