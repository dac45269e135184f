//! Dashboard handler.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use emporium_core::Permission;

use crate::{
    db::{DashboardStats, dashboard_stats},
    error::AppError,
    middleware::{RequireAdmin, require_permission},
    state::AppState,
};

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(index))
}

#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    require_permission(&admin, Permission::DashboardView)?;
    Ok(Json(dashboard_stats(state.pool()).await?))
}
