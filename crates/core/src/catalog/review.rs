//! Product reviews and the rating aggregate they maintain.
//!
//! Each product carries a denormalized `{count, average}` summary. The
//! [`ReviewBoard`] recomputes it from the stored reviews after every create
//! and delete, so it never drifts from the review table.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{CatalogError, CatalogResult, ConflictKind};
use crate::types::{ProductId, ReviewId, UserId};

use super::store::{ProductStore, ReviewStore};

/// Number of reviews shown on the homepage.
pub const RECENT_REVIEWS: i64 = 4;

/// A star rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = CatalogError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or_else(|| CatalogError::validation("Rating must be between 1 and 5."))
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Count and mean rating of a product's reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub count: i64,
    pub average: f64,
}

impl RatingSummary {
    /// Summarize a set of ratings. No ratings gives `0` / `0.0`.
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (count, total) = ratings
            .into_iter()
            .fold((0_i64, 0_i64), |(n, sum), r| (n + 1, sum + i64::from(r.get())));
        if count == 0 {
            return Self::default();
        }
        #[allow(clippy::cast_precision_loss)]
        let average = total as f64 / count as f64;
        Self { count, average }
    }
}

/// A stored review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Display name of the reviewer at the time of writing.
    pub author_name: String,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Shopper-supplied review fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i32,
    pub title: String,
    pub comment: String,
}

/// A validated review ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: String,
    pub rating: Rating,
    pub title: String,
    pub comment: String,
}

impl NewReview {
    /// Validate shopper input for `product` by `user`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for an out-of-range rating or an
    /// empty title or comment.
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        author_name: &str,
        input: ReviewInput,
    ) -> CatalogResult<Self> {
        let rating = Rating::try_from(input.rating)?;
        let title = input.title.trim();
        let comment = input.comment.trim();
        if title.is_empty() {
            return Err(CatalogError::validation("Title is required."));
        }
        if comment.is_empty() {
            return Err(CatalogError::validation("Comment is required."));
        }
        Ok(Self {
            product_id,
            user_id,
            author_name: author_name.trim().to_owned(),
            rating,
            title: title.to_owned(),
            comment: comment.to_owned(),
        })
    }
}

/// Review rules on top of a store that also holds products.
#[derive(Debug, Clone)]
pub struct ReviewBoard<S> {
    store: S,
}

impl<S: ReviewStore + ProductStore> ReviewBoard<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Post a review. One review per user and product.
    ///
    /// # Errors
    ///
    /// - `CatalogError::Validation` for bad input.
    /// - `CatalogError::ProductNotFound` if the product does not exist.
    /// - `CatalogError::AlreadyReviewed` if the user already reviewed it.
    #[instrument(skip(self, author_name, input), fields(product_id = %product, user_id = %user))]
    pub async fn create(
        &self,
        user: UserId,
        author_name: &str,
        product: ProductId,
        input: ReviewInput,
    ) -> CatalogResult<Review> {
        let new = NewReview::new(product, user, author_name, input)?;

        if self.store.get_product(product).await?.is_none() {
            return Err(CatalogError::ProductNotFound(product));
        }
        if self.store.find_review(user, product).await?.is_some() {
            return Err(CatalogError::AlreadyReviewed);
        }

        let review = match self.store.insert_review(&new).await {
            Ok(review) => review,
            Err(e) if e.conflict_kind() == Some(ConflictKind::Review) => {
                return Err(CatalogError::AlreadyReviewed);
            }
            Err(e) => return Err(e.into()),
        };

        let summary = self.refresh_rating(product).await?;
        info!(review_id = %review.id, rating = %review.rating, count = summary.count, "Review created");
        Ok(review)
    }

    /// Remove a review and update the product's rating.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the review does not exist.
    #[instrument(skip(self), fields(review_id = %id))]
    pub async fn delete(&self, id: ReviewId) -> CatalogResult<()> {
        let review = self
            .store
            .get_review(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("review {id}")))?;

        if !self.store.delete_review(id).await? {
            return Err(CatalogError::NotFound(format!("review {id}")));
        }

        let summary = self.refresh_rating(review.product_id).await?;
        info!(product_id = %review.product_id, count = summary.count, "Review deleted");
        Ok(())
    }

    /// Recompute and store a product's rating summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn refresh_rating(&self, product: ProductId) -> CatalogResult<RatingSummary> {
        let summary = self.store.rating_summary(product).await?;
        self.store.set_product_rating(product, summary).await?;
        Ok(summary)
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list_for_product(&self, product: ProductId) -> CatalogResult<Vec<Review>> {
        Ok(self.store.reviews_for_product(product).await?)
    }

    /// Most recent reviews across the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn recent(&self, limit: i64) -> CatalogResult<Vec<Review>> {
        Ok(self.store.recent_reviews(limit).await?)
    }
}
