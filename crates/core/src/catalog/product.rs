//! Products and their catalog rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{CatalogError, CatalogResult, ConflictKind};
use crate::types::{CategoryId, Price, ProductId, Slug};

use super::pricing::effective_price;
use super::review::RatingSummary;
use super::slug::unique_slug;
use super::store::{CategoryStore, ProductStore};
use super::variant::{NewVariant, Variant, validate_variants};

const MAX_SLUG_RETRIES: usize = 3;

/// Kind of a product media item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

/// One entry of a product's gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMedia {
    #[serde(default, rename = "type")]
    pub kind: MediaKind,
    pub url: String,
}

impl ProductMedia {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            url: url.into(),
        }
    }
}

/// A stored product with its variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub base_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub category_id: CategoryId,
    pub media: Vec<ProductMedia>,
    pub is_active: bool,
    pub variants: Vec<Variant>,
    /// Maintained by the review board; never set directly.
    pub rating: RatingSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The sale price, if it actually undercuts the base price.
    #[must_use]
    pub fn active_sale_price(&self) -> Option<Decimal> {
        self.sale_price.filter(|s| *s < self.base_price)
    }

    /// What the product costs without a variant selected.
    #[must_use]
    pub fn price(&self) -> Price {
        Price::usd(effective_price(self, None))
    }

    /// First image of the gallery, for listings.
    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.media
            .iter()
            .find(|m| m.kind == MediaKind::Image)
            .map(|m| m.url.as_str())
    }
}

const fn default_active() -> bool {
    true
}

/// Admin-supplied fields for creating or editing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub base_price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    pub category_id: CategoryId,
    #[serde(default)]
    pub media: Vec<ProductMedia>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub variants: Vec<NewVariant>,
}

impl ProductInput {
    /// Trim fields and check every rule that does not need the store.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` describing the first problem found.
    pub fn normalized(mut self) -> CatalogResult<Self> {
        self.name = self.name.trim().to_owned();
        self.description = self.description.trim().to_owned();

        if self.name.is_empty() {
            return Err(CatalogError::validation("Product name is required."));
        }
        if self.description.is_empty() {
            return Err(CatalogError::validation("Product description is required."));
        }
        if self.base_price.is_sign_negative() {
            return Err(CatalogError::validation("Price cannot be negative."));
        }
        if let Some(sale) = self.sale_price {
            if sale.is_sign_negative() {
                return Err(CatalogError::validation("Sale price cannot be negative."));
            }
            if sale >= self.base_price {
                return Err(CatalogError::validation(
                    "Sale price must be less than the regular price.",
                ));
            }
        }
        if self.media.is_empty() {
            return Err(CatalogError::validation("At least one image is required."));
        }
        if self.media.iter().any(|m| m.url.trim().is_empty()) {
            return Err(CatalogError::validation("Media items need a URL."));
        }
        validate_variants(&self.variants)?;
        Ok(self)
    }
}

/// A product row with its slug computed, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub base_price: Decimal,
    pub sale_price: Option<Decimal>,
    pub category_id: CategoryId,
    pub media: Vec<ProductMedia>,
    pub is_active: bool,
    pub variants: Vec<NewVariant>,
}

/// Which products to list.
///
/// Deserializes from a query string such as
/// `?categories=3,7&min_price=10&max_price=50&on_sale=true&limit=4`.
/// Price bounds are inclusive and apply to the effective price, so a
/// product on sale is judged by its sale price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductFilter {
    /// Empty means every category.
    #[serde(default, alias = "category_id", deserialize_with = "comma_separated_ids")]
    pub categories: Vec<CategoryId>,
    /// Hide products switched off by the admin.
    #[serde(default)]
    pub active_only: bool,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    /// Only products whose sale price undercuts the base price.
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub limit: Option<u32>,
}

fn comma_separated_ids<'de, D>(deserializer: D) -> Result<Vec<CategoryId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(serde::de::Error::custom))
        .collect()
}

impl ProductFilter {
    /// What shoppers may see.
    #[must_use]
    pub const fn storefront() -> Self {
        Self {
            categories: Vec::new(),
            active_only: true,
            min_price: None,
            max_price: None,
            on_sale: false,
            limit: None,
        }
    }

    #[must_use]
    pub fn in_category(mut self, category: CategoryId) -> Self {
        self.categories = vec![category];
        self
    }

    /// Whether `product` passes the filter. `limit` is applied by the store.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let price = effective_price(product, None);
        (self.categories.is_empty() || self.categories.contains(&product.category_id))
            && (!self.active_only || product.is_active)
            && self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
            && (!self.on_sale || product.active_sale_price().is_some())
    }
}

/// Product rules on top of a store that also knows categories.
#[derive(Debug, Clone)]
pub struct ProductCatalog<S> {
    store: S,
}

impl<S: ProductStore + CategoryStore> ProductCatalog<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    async fn prepare(&self, id: Option<ProductId>, input: ProductInput) -> CatalogResult<ProductRecord> {
        let input = input.normalized()?;
        if self.store.get_category(input.category_id).await?.is_none() {
            return Err(CatalogError::validation(format!(
                "Category {} does not exist.",
                input.category_id
            )));
        }
        let slug = unique_slug(&self.store, &input.name, id).await?;

        Ok(ProductRecord {
            name: input.name,
            slug,
            description: input.description,
            base_price: input.base_price,
            sale_price: input.sale_price,
            category_id: input.category_id,
            media: input.media,
            is_active: input.is_active,
            variants: input.variants,
        })
    }

    async fn write(&self, id: Option<ProductId>, mut record: ProductRecord) -> CatalogResult<Product> {
        let mut attempt = 0;
        loop {
            let result = match id {
                None => self.store.insert_product(&record).await.map(Some),
                Some(id) => self.store.update_product(id, &record).await,
            };

            match result {
                Ok(Some(product)) => return Ok(product),
                Ok(None) => {
                    return Err(CatalogError::ProductNotFound(
                        id.unwrap_or_else(|| ProductId::new(0)),
                    ));
                }
                Err(e) if e.conflict_kind() == Some(ConflictKind::Slug) => {
                    attempt += 1;
                    if attempt > MAX_SLUG_RETRIES {
                        return Err(CatalogError::SlugConflict(record.slug.into_inner()));
                    }
                    warn!(slug = %record.slug, attempt, "slug claimed concurrently, regenerating");
                    record.slug = unique_slug(&self.store, &record.name, id).await?;
                }
                Err(e) if e.conflict_kind().is_some() => {
                    return Err(CatalogError::Conflict(e.to_string()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns validation (including an unknown category), conflict or store errors.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ProductInput) -> CatalogResult<Product> {
        let record = self.prepare(None, input).await?;
        let product = self.write(None, record).await?;
        info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Edit a product. The slug follows the name on every save.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` plus everything [`Self::create`] can return.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, input: ProductInput) -> CatalogResult<Product> {
        if self.store.get_product(id).await?.is_none() {
            return Err(CatalogError::ProductNotFound(id));
        }
        let record = self.prepare(Some(id), input).await?;
        let product = self.write(Some(id), record).await?;
        info!(slug = %product.slug, "Product updated");
        Ok(product)
    }

    /// Delete a product with its variants and reviews.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` or a store error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> CatalogResult<()> {
        if !self.store.delete_product(id).await? {
            return Err(CatalogError::ProductNotFound(id));
        }
        info!("Product deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        Ok(self.store.get_product(id).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<Product>> {
        Ok(self.store.get_product_by_slug(slug).await?)
    }

    /// Products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self, filter: &ProductFilter) -> CatalogResult<Vec<Product>> {
        Ok(self.store.list_products(filter).await?)
    }
}
