//! Store settings handlers.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use emporium_core::Permission;
use emporium_core::content::{SettingsPatch, StoreSettings};

use crate::{
    error::AppError,
    middleware::{RequireAdmin, require_permission},
    state::AppState,
};

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(show).put(update))
}

#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<StoreSettings>, AppError> {
    require_permission(&admin, Permission::SettingsView)?;
    Ok(Json(state.content().settings().await?))
}

/// Apply a partial update; fields left out of the body keep their value.
#[instrument(skip(admin, state, patch))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<StoreSettings>, AppError> {
    require_permission(&admin, Permission::SettingsEdit)?;
    let settings = state.content().update_settings(patch).await?;
    tracing::info!(user_id = %admin.id, "Store settings updated");
    Ok(Json(settings))
}
