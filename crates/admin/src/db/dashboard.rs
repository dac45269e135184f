//! Dashboard counters.

use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// Headline numbers for the back-office dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub products: i64,
    pub active_products: i64,
    pub categories: i64,
    pub reviews: i64,
    /// Mean of all review ratings, 0 when there are none.
    pub average_rating: f64,
}

/// Count products, categories and reviews in one round trip.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn dashboard_stats(pool: &PgPool) -> Result<DashboardStats, RepositoryError> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        "SELECT
             (SELECT COUNT(*) FROM product) AS products,
             (SELECT COUNT(*) FROM product WHERE is_active) AS active_products,
             (SELECT COUNT(*) FROM category) AS categories,
             (SELECT COUNT(*) FROM review) AS reviews,
             (SELECT COALESCE(AVG(rating)::DOUBLE PRECISION, 0) FROM review) AS average_rating",
    )
    .fetch_one(pool)
    .await?;

    Ok(stats)
}
