//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                   - Liveness
//! GET    /health/ready             - Readiness (database)
//!
//! GET    /api/dashboard            - Headline counts
//!
//! GET    /api/categories           - All categories
//! POST   /api/categories           - Create category
//! GET    /api/categories/{id}      - One category
//! PUT    /api/categories/{id}      - Edit category
//! DELETE /api/categories/{id}      - Delete category
//!
//! GET    /api/products             - Products (?category_id, ?active_only)
//! POST   /api/products             - Create product
//! GET    /api/products/{id}        - One product
//! PUT    /api/products/{id}        - Edit product
//! DELETE /api/products/{id}        - Delete product
//! GET    /api/products/{id}/reviews - Reviews of a product
//! DELETE /api/reviews/{id}         - Delete review
//!
//! GET    /api/banners              - All banners
//! POST   /api/banners              - Create banner
//! PUT    /api/banners/{id}         - Edit banner
//! DELETE /api/banners/{id}         - Delete banner
//!
//! GET    /api/settings             - Store settings
//! PUT    /api/settings             - Patch store settings
//!
//! GET    /api/roles                - Roles
//! POST   /api/roles                - Create role
//! PUT    /api/roles/{id}           - Edit role
//! POST   /api/roles/seed           - Upsert the predefined roles
//! ```
//!
//! Every `/api` route needs a bearer token carrying the permission named on
//! its handler.

pub mod banners;
pub mod categories;
pub mod dashboard;
pub mod products;
pub mod reviews;
pub mod roles;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(categories::router())
        .merge(products::router())
        .merge(reviews::router())
        .merge(banners::router())
        .merge(settings::router())
        .merge(roles::router())
}
