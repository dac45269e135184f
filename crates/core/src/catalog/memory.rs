//! In-memory catalog store.
//!
//! Used by the test suites and by `emporium seed categories --dry-run`.
//! Enforces the same unique constraints as the Postgres schema and reports
//! them with the same [`ConflictKind`]s.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::error::{ConflictKind, StoreError};
use crate::types::{CategoryId, ProductId, ReviewId, UserId, VariantId};

use super::category::{Category, CategoryRecord};
use super::product::{Product, ProductFilter, ProductRecord};
use super::review::{NewReview, RatingSummary, Review};
use super::store::{CategoryStore, ProductStore, ReviewStore, SlugIndex};
use super::variant::Variant;

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    reviews: BTreeMap<ReviewId, Review>,
    last_id: i32,
    /// Number of upcoming category writes to fail with a slug conflict.
    #[cfg(test)]
    slug_conflicts: usize,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    #[cfg(test)]
    fn take_injected_conflict(&mut self) -> bool {
        let injected = self.slug_conflicts > 0;
        self.slug_conflicts = self.slug_conflicts.saturating_sub(1);
        injected
    }

    #[cfg(not(test))]
    #[allow(clippy::unused_self)]
    const fn take_injected_conflict(&mut self) -> bool {
        false
    }

    fn check_category(&mut self, id: Option<CategoryId>, record: &CategoryRecord) -> Result<(), StoreError> {
        if self.take_injected_conflict() {
            return Err(StoreError::conflict(ConflictKind::Slug, "category_slug_key"));
        }

        let others = self.categories.values().filter(|c| Some(c.id) != id);
        for other in others {
            if other.slug == record.slug {
                return Err(StoreError::conflict(ConflictKind::Slug, "category_slug_key"));
            }
            if other.parent == record.parent && other.name == record.name {
                return Err(StoreError::conflict(
                    ConflictKind::SiblingName,
                    "category_parent_name_key",
                ));
            }
        }
        if let Some(parent) = record.parent {
            if !self.categories.contains_key(&parent) {
                return Err(StoreError::conflict(ConflictKind::Other, "category_parent_id_fkey"));
            }
        }
        Ok(())
    }

    fn check_product(&self, id: Option<ProductId>, record: &ProductRecord) -> Result<(), StoreError> {
        if self
            .products
            .values()
            .any(|p| Some(p.id) != id && p.slug == record.slug)
        {
            return Err(StoreError::conflict(ConflictKind::Slug, "product_slug_key"));
        }
        if !self.categories.contains_key(&record.category_id) {
            return Err(StoreError::conflict(ConflictKind::Other, "product_category_id_fkey"));
        }
        Ok(())
    }

    fn variants(&mut self, record: &ProductRecord) -> Vec<Variant> {
        record
            .variants
            .iter()
            .cloned()
            .map(|v| Variant::from_new(VariantId::new(self.next_id()), v))
            .collect()
    }
}

/// Catalog store backed by maps behind a mutex. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next `n` category writes fail as if another writer had
    /// claimed the slug first.
    #[cfg(test)]
    pub(crate) fn inject_slug_conflicts(&self, n: usize) {
        self.lock().slug_conflicts = n;
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i32)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl SlugIndex<CategoryId> for MemoryStore {
    async fn slug_owner(&self, slug: &str) -> Result<Option<CategoryId>, StoreError> {
        Ok(self
            .lock()
            .categories
            .values()
            .find(|c| c.slug.as_str() == slug)
            .map(|c| c.id))
    }
}

impl SlugIndex<ProductId> for MemoryStore {
    async fn slug_owner(&self, slug: &str) -> Result<Option<ProductId>, StoreError> {
        Ok(self
            .lock()
            .products
            .values()
            .find(|p| p.slug.as_str() == slug)
            .map(|p| p.id))
    }
}

impl CategoryStore for MemoryStore {
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.lock().categories.get(&id).cloned())
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        Ok(self
            .lock()
            .categories
            .values()
            .find(|c| c.slug.as_str() == slug)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut all: Vec<_> = self.lock().categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn insert_category(&self, record: &CategoryRecord) -> Result<Category, StoreError> {
        let mut state = self.lock();
        state.check_category(None, record)?;

        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(state.next_id()),
            name: record.name.clone(),
            slug: record.slug.clone(),
            description: record.description.clone(),
            image: record.image.clone(),
            parent: record.parent,
            ancestors: record.ancestors.clone(),
            created_at: now,
            updated_at: now,
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        record: &CategoryRecord,
    ) -> Result<Option<Category>, StoreError> {
        let mut state = self.lock();
        if !state.categories.contains_key(&id) {
            return Ok(None);
        }
        state.check_category(Some(id), record)?;

        let Some(category) = state.categories.get_mut(&id) else {
            return Ok(None);
        };
        category.name.clone_from(&record.name);
        category.slug = record.slug.clone();
        category.description.clone_from(&record.description);
        category.image.clone_from(&record.image);
        category.parent = record.parent;
        category.ancestors.clone_from(&record.ancestors);
        category.updated_at = Utc::now();
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        let referenced = state.categories.values().any(|c| c.parent == Some(id))
            || state.products.values().any(|p| p.category_id == id);
        if referenced {
            return Err(StoreError::conflict(ConflictKind::Other, "category is still referenced"));
        }
        Ok(state.categories.remove(&id).is_some())
    }

    async fn count_children(&self, id: CategoryId) -> Result<i64, StoreError> {
        let n = self
            .lock()
            .categories
            .values()
            .filter(|c| c.parent == Some(id))
            .count();
        Ok(i64::try_from(n).unwrap_or(i64::MAX))
    }

    async fn category_in_use(&self, id: CategoryId) -> Result<bool, StoreError> {
        Ok(self.lock().products.values().any(|p| p.category_id == id))
    }
}

impl ProductStore for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .lock()
            .products
            .values()
            .find(|p| p.slug.as_str() == slug)
            .cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut found: Vec<_> = self
            .lock()
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        newest_first(&mut found, |p| (p.created_at, p.id.as_i32()));
        if let Some(limit) = filter.limit {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Ok(found)
    }

    async fn insert_product(&self, record: &ProductRecord) -> Result<Product, StoreError> {
        let mut state = self.lock();
        state.check_product(None, record)?;

        let now = Utc::now();
        let id = ProductId::new(state.next_id());
        let variants = state.variants(record);
        let product = Product {
            id,
            name: record.name.clone(),
            slug: record.slug.clone(),
            description: record.description.clone(),
            base_price: record.base_price,
            sale_price: record.sale_price,
            category_id: record.category_id,
            media: record.media.clone(),
            is_active: record.is_active,
            variants,
            rating: RatingSummary::default(),
            created_at: now,
            updated_at: now,
        };
        state.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        record: &ProductRecord,
    ) -> Result<Option<Product>, StoreError> {
        let mut state = self.lock();
        if !state.products.contains_key(&id) {
            return Ok(None);
        }
        state.check_product(Some(id), record)?;
        let variants = state.variants(record);

        let Some(product) = state.products.get_mut(&id) else {
            return Ok(None);
        };
        product.name.clone_from(&record.name);
        product.slug = record.slug.clone();
        product.description.clone_from(&record.description);
        product.base_price = record.base_price;
        product.sale_price = record.sale_price;
        product.category_id = record.category_id;
        product.media.clone_from(&record.media);
        product.is_active = record.is_active;
        product.variants = variants;
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut state = self.lock();
        state.reviews.retain(|_, r| r.product_id != id);
        Ok(state.products.remove(&id).is_some())
    }

    async fn set_product_rating(&self, id: ProductId, summary: RatingSummary) -> Result<(), StoreError> {
        if let Some(product) = self.lock().products.get_mut(&id) {
            product.rating = summary;
        }
        Ok(())
    }
}

impl ReviewStore for MemoryStore {
    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        Ok(self.lock().reviews.get(&id).cloned())
    }

    async fn find_review(&self, user: UserId, product: ProductId) -> Result<Option<Review>, StoreError> {
        Ok(self
            .lock()
            .reviews
            .values()
            .find(|r| r.user_id == user && r.product_id == product)
            .cloned())
    }

    async fn insert_review(&self, review: &NewReview) -> Result<Review, StoreError> {
        let mut state = self.lock();
        if state
            .reviews
            .values()
            .any(|r| r.user_id == review.user_id && r.product_id == review.product_id)
        {
            return Err(StoreError::conflict(ConflictKind::Review, "review_product_user_key"));
        }
        if !state.products.contains_key(&review.product_id) {
            return Err(StoreError::conflict(ConflictKind::Other, "review_product_id_fkey"));
        }

        let stored = Review {
            id: ReviewId::new(state.next_id()),
            product_id: review.product_id,
            user_id: review.user_id,
            author_name: review.author_name.clone(),
            rating: review.rating,
            title: review.title.clone(),
            comment: review.comment.clone(),
            created_at: Utc::now(),
        };
        state.reviews.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError> {
        Ok(self.lock().reviews.remove(&id).is_some())
    }

    async fn reviews_for_product(&self, product: ProductId) -> Result<Vec<Review>, StoreError> {
        let mut found: Vec<_> = self
            .lock()
            .reviews
            .values()
            .filter(|r| r.product_id == product)
            .cloned()
            .collect();
        newest_first(&mut found, |r| (r.created_at, r.id.as_i32()));
        Ok(found)
    }

    async fn recent_reviews(&self, limit: i64) -> Result<Vec<Review>, StoreError> {
        let mut all: Vec<_> = self.lock().reviews.values().cloned().collect();
        newest_first(&mut all, |r| (r.created_at, r.id.as_i32()));
        all.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(all)
    }

    async fn rating_summary(&self, product: ProductId) -> Result<RatingSummary, StoreError> {
        Ok(RatingSummary::from_ratings(
            self.lock()
                .reviews
                .values()
                .filter(|r| r.product_id == product)
                .map(|r| r.rating),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Slug;

    fn record(name: &str, slug: &str, parent: Option<CategoryId>) -> CategoryRecord {
        CategoryRecord {
            name: name.to_owned(),
            slug: Slug::from_stored(slug.to_owned()),
            description: "d".into(),
            image: "https://cdn.example.com/i.jpg".into(),
            parent,
            ancestors: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_slug_is_unique() {
        let store = MemoryStore::new();
        store.insert_category(&record("A", "a", None)).await.unwrap();
        let err = store.insert_category(&record("B", "a", None)).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::Slug));
    }

    #[tokio::test]
    async fn test_sibling_names_are_unique_per_parent() {
        let store = MemoryStore::new();
        let root = store.insert_category(&record("Root", "root", None)).await.unwrap();
        store
            .insert_category(&record("Shoes", "shoes", Some(root.id)))
            .await
            .unwrap();

        let err = store
            .insert_category(&record("Shoes", "shoes-1", Some(root.id)))
            .await
            .unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::SiblingName));

        // Same name under a different parent is fine.
        assert!(store.insert_category(&record("Shoes", "shoes-2", None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_may_keep_own_slug() {
        let store = MemoryStore::new();
        let cat = store.insert_category(&record("A", "a", None)).await.unwrap();
        let updated = store
            .update_category(cat.id, &record("A", "a", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.slug.as_str(), "a");
        assert!(store
            .update_category(CategoryId::new(42), &record("A", "a", None))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.insert_category(&record("A", "a", None)).await.unwrap();
        let owner = SlugIndex::<CategoryId>::slug_owner(&other, "a").await.unwrap();
        assert!(owner.is_some());
    }
}
