//! Product page handlers.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use tracing::instrument;

use emporium_core::catalog::{Product, ProductFilter, Selection};

use crate::{
    error::AppError,
    services::{ProductDetail, VariantChoice},
    state::AppState,
};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(index))
        .route("/api/products/{slug}", get(show))
        .route("/api/products/{slug}/variant", get(variant))
}

/// Shop listing: active products, newest first.
///
/// `?categories=3,7&min_price=10&max_price=50&on_sale=true&limit=4`; every
/// parameter is optional.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.catalog().products(filter).await?))
}

/// Product detail with option axes and the default selection resolved.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>, AppError> {
    Ok(Json(state.catalog().product(&slug).await?))
}

/// Resolve the option values in the query string to a variant.
///
/// Every query parameter is an axis name and its chosen value, e.g.
/// `?Color=Red&Size=M`.
#[instrument(skip(state, query))]
pub async fn variant(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<VariantChoice>, AppError> {
    if query.is_empty() {
        return Err(AppError::BadRequest(
            "pass the chosen option values as query parameters".to_string(),
        ));
    }
    let selection: Selection = query.into_iter().collect();
    Ok(Json(state.catalog().resolve(&slug, selection).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Uri;
    use emporium_core::CategoryId;
    use rust_decimal::Decimal;

    use super::*;

    fn parse(uri: &str) -> ProductFilter {
        let uri: Uri = uri.parse().unwrap();
        Query::<ProductFilter>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn test_listing_query_parses_every_filter() {
        let filter = parse(
            "/api/products?categories=3,7&min_price=10.50&max_price=50&on_sale=true&limit=4",
        );
        assert_eq!(filter.categories, [CategoryId::new(3), CategoryId::new(7)]);
        assert_eq!(filter.min_price, Some(Decimal::new(1050, 2)));
        assert_eq!(filter.max_price, Some(Decimal::new(50, 0)));
        assert!(filter.on_sale);
        assert_eq!(filter.limit, Some(4));
    }

    #[test]
    fn test_empty_listing_query_matches_everything() {
        assert_eq!(parse("/api/products"), ProductFilter::default());
    }

    #[test]
    fn test_bad_category_id_is_rejected() {
        let uri: Uri = "/api/products?categories=3,shoes".parse().unwrap();
        assert!(Query::<ProductFilter>::try_from_uri(&uri).is_err());
    }
}
