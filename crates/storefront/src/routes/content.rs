//! Homepage banners and public store settings.

use axum::{Json, Router, extract::State, routing::get};

use emporium_core::content::{Banner, StoreSettings};

use crate::{error::AppError, state::AppState};

/// Build the content router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/banners", get(banners))
        .route("/api/settings", get(settings))
}

/// Active banners in display order.
pub async fn banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>, AppError> {
    Ok(Json(state.content().list_banners(true).await?))
}

pub async fn settings(State(state): State<AppState>) -> Result<Json<StoreSettings>, AppError> {
    Ok(Json(state.content().settings().await?))
}
