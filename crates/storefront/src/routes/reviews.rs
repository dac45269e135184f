//! Review handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use emporium_core::catalog::{Review, ReviewInput};

use crate::{error::AppError, middleware::RequireCustomer, state::AppState};

/// Build the reviews router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products/{slug}/reviews", get(index).post(create))
        .route("/api/reviews/recent", get(recent))
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.catalog().reviews(&slug).await?))
}

/// Post a review as the signed-in customer.
#[instrument(skip(customer, state, input), fields(user_id = %customer.id))]
pub async fn create(
    RequireCustomer(customer): RequireCustomer,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(input): Json<ReviewInput>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state.catalog().add_review(&customer, &slug, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn recent(State(state): State<AppState>) -> Result<Json<Vec<Review>>, AppError> {
    Ok(Json(state.catalog().recent_reviews().await?))
}
