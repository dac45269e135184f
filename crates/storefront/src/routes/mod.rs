//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Liveness
//! GET  /health/ready                     - Readiness (database)
//!
//! # Catalog
//! GET  /api/navigation                   - Top-level categories (cached)
//! GET  /api/navigation/tree              - Nested hierarchy (cached)
//! GET  /api/categories                   - All categories
//! GET  /api/categories/{slug}            - One category
//! GET  /api/categories/{slug}/products   - Category page with active products
//! GET  /api/products                     - Shop listing (?categories=1,2&min_price=&max_price=&on_sale=&limit=)
//! GET  /api/products/{slug}              - Product page
//! GET  /api/products/{slug}/variant      - Resolve ?Color=Red&Size=M
//!
//! # Reviews
//! GET  /api/products/{slug}/reviews      - Reviews, newest first
//! POST /api/products/{slug}/reviews      - Post a review (bearer token)
//! GET  /api/reviews/recent               - Latest reviews for the homepage
//!
//! # Content
//! GET  /api/banners                      - Active banners in display order
//! GET  /api/settings                     - Store name, contact, theme
//! ```

pub mod categories;
pub mod content;
pub mod products;
pub mod reviews;

use axum::Router;

use crate::state::AppState;

/// Build the complete storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(categories::router())
        .merge(products::router())
        .merge(reviews::router())
        .merge(content::router())
}
