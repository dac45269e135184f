//! Storage seams for the catalog.
//!
//! The rules in this crate never talk to a database directly. They are
//! generic over these traits, which the Postgres store and the in-memory
//! store both implement. All methods are single round trips; uniqueness
//! violations come back as [`StoreError::Conflict`] so the rules can tell a
//! lost race from a backend failure.

use std::future::Future;

use crate::error::StoreError;
use crate::types::{CategoryId, ProductId, ReviewId, UserId};

use super::category::{Category, CategoryRecord};
use super::product::{Product, ProductFilter, ProductRecord};
use super::review::{NewReview, RatingSummary, Review};

/// Lookup of which entity currently owns a slug.
pub trait SlugIndex<I>: Send + Sync {
    /// The owner of `slug`, if any.
    fn slug_owner(&self, slug: &str) -> impl Future<Output = Result<Option<I>, StoreError>> + Send;
}

/// Persistence for the category hierarchy.
pub trait CategoryStore: SlugIndex<CategoryId> {
    /// Fetch one category.
    fn get_category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, StoreError>> + Send;

    /// Fetch one category by its slug.
    fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Category>, StoreError>> + Send;

    /// Every category, ordered by name.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, StoreError>> + Send;

    /// Insert a fully prepared category.
    fn insert_category(
        &self,
        record: &CategoryRecord,
    ) -> impl Future<Output = Result<Category, StoreError>> + Send;

    /// Overwrite a category. `None` if it no longer exists.
    fn update_category(
        &self,
        id: CategoryId,
        record: &CategoryRecord,
    ) -> impl Future<Output = Result<Option<Category>, StoreError>> + Send;

    /// Remove a category. `false` if it did not exist.
    fn delete_category(&self, id: CategoryId)
    -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Number of categories whose parent is `id`.
    fn count_children(&self, id: CategoryId)
    -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Whether any product references the category.
    fn category_in_use(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Persistence for products and their variants.
pub trait ProductStore: SlugIndex<ProductId> {
    /// Fetch one product with its variants.
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, StoreError>> + Send;

    /// Fetch one product by slug.
    fn get_product_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<Option<Product>, StoreError>> + Send;

    /// Products matching `filter`, newest first.
    fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> impl Future<Output = Result<Vec<Product>, StoreError>> + Send;

    /// Insert a product and its variants.
    fn insert_product(
        &self,
        record: &ProductRecord,
    ) -> impl Future<Output = Result<Product, StoreError>> + Send;

    /// Overwrite a product, replacing its variants. `None` if it no longer exists.
    fn update_product(
        &self,
        id: ProductId,
        record: &ProductRecord,
    ) -> impl Future<Output = Result<Option<Product>, StoreError>> + Send;

    /// Remove a product (its variants and reviews go with it).
    fn delete_product(&self, id: ProductId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Store the derived rating aggregate.
    fn set_product_rating(
        &self,
        id: ProductId,
        summary: RatingSummary,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Persistence for product reviews.
pub trait ReviewStore: Send + Sync {
    /// Fetch one review.
    fn get_review(
        &self,
        id: ReviewId,
    ) -> impl Future<Output = Result<Option<Review>, StoreError>> + Send;

    /// The review `user` left on `product`, if any.
    fn find_review(
        &self,
        user: UserId,
        product: ProductId,
    ) -> impl Future<Output = Result<Option<Review>, StoreError>> + Send;

    /// Insert a review. Fails with a `Review` conflict on a duplicate pair.
    fn insert_review(
        &self,
        review: &NewReview,
    ) -> impl Future<Output = Result<Review, StoreError>> + Send;

    /// Remove a review. `false` if it did not exist.
    fn delete_review(&self, id: ReviewId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Reviews of a product, newest first.
    fn reviews_for_product(
        &self,
        product: ProductId,
    ) -> impl Future<Output = Result<Vec<Review>, StoreError>> + Send;

    /// The most recent reviews across the store.
    fn recent_reviews(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Review>, StoreError>> + Send;

    /// Count and mean rating of a product's reviews.
    fn rating_summary(
        &self,
        product: ProductId,
    ) -> impl Future<Output = Result<RatingSummary, StoreError>> + Send;
}
