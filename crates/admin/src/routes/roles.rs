//! Role management handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use tracing::instrument;

use emporium_core::{Permission, RoleId, predefined_roles};

use crate::{
    db::RoleRepository,
    error::AppError,
    middleware::{RequireAdmin, require_permission},
    models::{Role, RoleInput},
    state::AppState,
};

/// Build the roles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/roles", get(index).post(create))
        .route("/api/roles/seed", post(seed))
        .route("/api/roles/{id}", put(update))
}

#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Role>>, AppError> {
    require_permission(&admin, Permission::RolesView)?;
    Ok(Json(RoleRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(admin, state, input), fields(name = %input.name))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<RoleInput>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    require_permission(&admin, Permission::RolesEdit)?;
    let input = input.normalized()?;
    let role = RoleRepository::new(state.pool()).create(&input).await?;
    tracing::info!(role_id = %role.id, "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

#[instrument(skip(admin, state, input), fields(name = %input.name))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<RoleId>,
    Json(input): Json<RoleInput>,
) -> Result<Json<Role>, AppError> {
    require_permission(&admin, Permission::RolesEdit)?;
    let input = input.normalized()?;
    Ok(Json(RoleRepository::new(state.pool()).update(id, &input).await?))
}

/// Upsert the predefined roles by name. Safe to call repeatedly.
#[instrument(skip(admin, state))]
pub async fn seed(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Role>>, AppError> {
    require_permission(&admin, Permission::RolesEdit)?;
    let repo = RoleRepository::new(state.pool());

    let mut seeded = Vec::new();
    for role in predefined_roles() {
        seeded.push(repo.upsert_by_name(&RoleInput::from(&role)).await?);
    }

    tracing::info!(count = seeded.len(), "Predefined roles seeded");
    Ok(Json(seeded))
}
