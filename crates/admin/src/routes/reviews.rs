//! Review moderation handlers.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::delete,
};
use tracing::instrument;

use emporium_core::{Permission, ReviewId};

use crate::{
    error::AppError,
    middleware::{RequireAdmin, require_permission},
    state::AppState,
};

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/reviews/{id}", delete(destroy))
}

/// Delete a review; the product's rating is recomputed.
#[instrument(skip(admin, state))]
pub async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ReviewId>,
) -> Result<StatusCode, AppError> {
    require_permission(&admin, Permission::ReviewsDelete)?;
    state.reviews().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
