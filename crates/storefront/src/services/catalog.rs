//! The storefront's view of the catalog.
//!
//! Wraps the core catalog services with what shoppers need: only active
//! products, product pages with their option axes, variant resolution and
//! reviews. Navigation (top-level categories and the nested tree) is cached
//! with `moka` for the configured TTL, so menu edits show up after at most
//! one TTL.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use emporium_core::auth::CurrentUser;
use emporium_core::catalog::{
    Category, CategoryNode, CategoryStore, CategoryTree, OptionAxes, Product, ProductCatalog,
    ProductFilter, ProductStore, Review, ReviewBoard, ReviewInput, ReviewStore, Selection,
    Variant, collect_option_axes, default_selection, effective_price, resolve_variant,
};
use emporium_core::catalog::review::RECENT_REVIEWS;
use emporium_core::CatalogError;
use emporium_core::error::CatalogResult;

/// Cache key for navigation data.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Nav,
    Tree,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Nav(Arc<Vec<Category>>),
    Tree(Arc<Vec<CategoryNode>>),
}

/// A category with its visible products.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Everything a product page needs on first render.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
    pub option_axes: OptionAxes,
    /// First value of every axis.
    pub default_selection: Selection,
    /// The variant the default selection resolves to, if any.
    pub default_variant: Option<Variant>,
    /// What the shopper pays for the default selection.
    pub price: Decimal,
}

/// Result of resolving a shopper's option selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantChoice {
    pub selection: Selection,
    pub available: bool,
    pub variant: Option<Variant>,
    pub in_stock: bool,
    /// Only set when the selection matches a variant.
    pub price: Option<Decimal>,
}

impl VariantChoice {
    fn resolve(product: &Product, selection: Selection) -> Self {
        let variant = resolve_variant(&product.variants, &selection).variant();
        Self {
            available: variant.is_some(),
            in_stock: variant.is_some_and(Variant::in_stock),
            price: variant.map(|v| effective_price(product, Some(v))),
            variant: variant.cloned(),
            selection,
        }
    }
}

/// Read-mostly catalog access for shoppers.
pub struct CatalogService<S> {
    categories: CategoryTree<S>,
    products: ProductCatalog<S>,
    reviews: ReviewBoard<S>,
    cache: Cache<CacheKey, CacheValue>,
}

impl<S> CatalogService<S>
where
    S: CategoryStore + ProductStore + ReviewStore + Clone,
{
    /// Build the service over `store`, caching navigation for `cache_ttl`.
    #[must_use]
    pub fn new(store: S, cache_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(cache_ttl)
            .build();

        Self {
            categories: CategoryTree::new(store.clone()),
            products: ProductCatalog::new(store.clone()),
            reviews: ReviewBoard::new(store),
            cache,
        }
    }

    /// Every category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn categories(&self) -> CatalogResult<Vec<Category>> {
        self.categories.list().await
    }

    /// Top-level categories for the main menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails on a cache miss.
    pub async fn nav(&self) -> CatalogResult<Arc<Vec<Category>>> {
        if let Some(CacheValue::Nav(nav)) = self.cache.get(&CacheKey::Nav).await {
            tracing::debug!("Navigation cache hit");
            return Ok(nav);
        }

        let nav = Arc::new(self.categories.top_level().await?);
        self.cache
            .insert(CacheKey::Nav, CacheValue::Nav(Arc::clone(&nav)))
            .await;
        Ok(nav)
    }

    /// The whole hierarchy, nested, for mega menus and sitemaps.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails on a cache miss.
    pub async fn tree(&self) -> CatalogResult<Arc<Vec<CategoryNode>>> {
        if let Some(CacheValue::Tree(tree)) = self.cache.get(&CacheKey::Tree).await {
            tracing::debug!("Category tree cache hit");
            return Ok(tree);
        }

        let tree = Arc::new(self.categories.tree().await?);
        self.cache
            .insert(CacheKey::Tree, CacheValue::Tree(Arc::clone(&tree)))
            .await;
        Ok(tree)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no category has this slug.
    pub async fn category(&self, slug: &str) -> CatalogResult<Category> {
        self.categories
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("category '{slug}'")))
    }

    /// A category and its active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no category has this slug.
    #[instrument(skip(self))]
    pub async fn category_page(&self, slug: &str) -> CatalogResult<CategoryPage> {
        let category = self.category(slug).await?;
        let products = self
            .products
            .list(&ProductFilter::storefront().in_category(category.id))
            .await?;
        Ok(CategoryPage { category, products })
    }

    /// Active products matching `filter`, newest first. Backs the shop
    /// listing as well as the homepage rows (newest arrivals, under a price).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if `min_price` exceeds `max_price`.
    #[instrument(skip(self))]
    pub async fn products(&self, filter: ProductFilter) -> CatalogResult<Vec<Product>> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(CatalogError::validation(
                    "min_price cannot be greater than max_price.",
                ));
            }
        }
        let filter = ProductFilter {
            active_only: true,
            ..filter
        };
        self.products.list(&filter).await
    }

    /// An active product by slug. Inactive products are reported missing.
    async fn active_product(&self, slug: &str) -> CatalogResult<Product> {
        self.products
            .get_by_slug(slug)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| CatalogError::NotFound(format!("product '{slug}'")))
    }

    /// Product page data: the product, its category, option axes and the
    /// default selection already resolved.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown or inactive products.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> CatalogResult<ProductDetail> {
        let product = self.active_product(slug).await?;
        let category = self.categories.get(product.category_id).await?;

        let option_axes = collect_option_axes(&product.variants);
        let selection = default_selection(&option_axes);
        let choice = VariantChoice::resolve(&product, selection);
        let price = choice
            .price
            .unwrap_or_else(|| effective_price(&product, None));

        Ok(ProductDetail {
            category,
            option_axes,
            default_selection: choice.selection,
            default_variant: choice.variant,
            price,
            product,
        })
    }

    /// Resolve `selection` against the product's variants.
    ///
    /// An unmatched combination is not an error; it comes back with
    /// `available: false` and no price.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown or inactive products.
    #[instrument(skip(self, selection), fields(axes = selection.len()))]
    pub async fn resolve(&self, slug: &str, selection: Selection) -> CatalogResult<VariantChoice> {
        let product = self.active_product(slug).await?;
        Ok(VariantChoice::resolve(&product, selection))
    }

    /// Reviews of an active product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for unknown or inactive products.
    pub async fn reviews(&self, slug: &str) -> CatalogResult<Vec<Review>> {
        let product = self.active_product(slug).await?;
        self.reviews.list_for_product(product.id).await
    }

    /// Post a review as `user`.
    ///
    /// # Errors
    ///
    /// - `CatalogError::NotFound` for unknown or inactive products.
    /// - `CatalogError::Validation` for a bad rating, title or comment.
    /// - `CatalogError::AlreadyReviewed` if `user` reviewed it before.
    #[instrument(skip(self, user, input), fields(user_id = %user.id))]
    pub async fn add_review(
        &self,
        user: &CurrentUser,
        slug: &str,
        input: ReviewInput,
    ) -> CatalogResult<Review> {
        let product = self.active_product(slug).await?;
        self.reviews
            .create(user.id, &user.name, product.id, input)
            .await
    }

    /// The latest reviews across the store, for the homepage.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn recent_reviews(&self) -> CatalogResult<Vec<Review>> {
        self.reviews.recent(RECENT_REVIEWS).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::catalog::{
        CategoryInput, MemoryStore, NewVariant, OptionAssignment, ProductInput, ProductMedia,
    };
    use emporium_core::{CategoryId, PermissionSet, UserId};

    use super::*;

    struct Fixture {
        service: CatalogService<MemoryStore>,
        store: MemoryStore,
        audio: CategoryId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let audio = CategoryTree::new(store.clone())
            .create(category("Audio", None))
            .await
            .unwrap();
        Fixture {
            service: CatalogService::new(store.clone(), Duration::from_secs(300)),
            store,
            audio: audio.id,
        }
    }

    fn category(name: &str, parent: Option<CategoryId>) -> CategoryInput {
        CategoryInput {
            name: name.to_owned(),
            description: format!("{name} gear"),
            image: "https://cdn.example.com/c.jpg".into(),
            parent,
        }
    }

    fn variant(sku: &str, options: &[(&str, &str)], price: Option<i64>, stock: i32) -> NewVariant {
        NewVariant {
            sku: sku.to_owned(),
            price_override: price.map(|p| Decimal::new(p, 0)),
            stock,
            weight_grams: None,
            dimensions: None,
            options: options
                .iter()
                .map(|(n, v)| OptionAssignment::new(*n, *v))
                .collect(),
        }
    }

    fn tee(category: CategoryId, is_active: bool) -> ProductInput {
        ProductInput {
            name: "Logo Tee".into(),
            description: "Heavyweight cotton".into(),
            base_price: Decimal::new(100, 0),
            sale_price: Some(Decimal::new(80, 0)),
            category_id: category,
            media: vec![ProductMedia::image("https://cdn.example.com/tee.jpg")],
            is_active,
            variants: vec![
                variant("TEE-RED-S", &[("Color", "Red"), ("Size", "S")], None, 4),
                variant("TEE-RED-M", &[("Color", "Red"), ("Size", "M")], Some(90), 0),
                variant("TEE-BLU-M", &[("Color", "Blue"), ("Size", "M")], None, 2),
            ],
        }
    }

    fn shopper() -> CurrentUser {
        CurrentUser {
            id: UserId::new(42),
            name: "Lin".into(),
            role: String::new(),
            permissions: PermissionSet::default(),
        }
    }

    #[tokio::test]
    async fn test_product_detail_resolves_default_selection() {
        let f = fixture().await;
        ProductCatalog::new(f.store.clone())
            .create(tee(f.audio, true))
            .await
            .unwrap();

        let detail = f.service.product("logo-tee").await.unwrap();
        assert_eq!(detail.option_axes.len(), 2);
        assert_eq!(detail.default_selection.get("Color"), Some("Red"));
        assert_eq!(detail.default_selection.get("Size"), Some("S"));
        assert_eq!(detail.default_variant.unwrap().sku, "TEE-RED-S");
        assert_eq!(detail.price, Decimal::new(80, 0));
        assert_eq!(detail.category.unwrap().slug.as_str(), "audio");
    }

    #[tokio::test]
    async fn test_resolve_uses_variant_price_and_stock() {
        let f = fixture().await;
        ProductCatalog::new(f.store.clone())
            .create(tee(f.audio, true))
            .await
            .unwrap();

        let red_m = Selection::new().select("Color", "Red").select("Size", "M");
        let choice = f.service.resolve("logo-tee", red_m).await.unwrap();
        assert!(choice.available);
        assert!(!choice.in_stock);
        assert_eq!(choice.price, Some(Decimal::new(90, 0)));

        let blue_s = Selection::new().select("Color", "Blue").select("Size", "S");
        let choice = f.service.resolve("logo-tee", blue_s).await.unwrap();
        assert!(!choice.available);
        assert!(choice.variant.is_none());
        assert_eq!(choice.price, None);

        let partial = Selection::new().select("Color", "Blue");
        let choice = f.service.resolve("logo-tee", partial).await.unwrap();
        assert!(!choice.available);
        assert_eq!(choice.price, None);
    }

    #[tokio::test]
    async fn test_inactive_products_are_hidden() {
        let f = fixture().await;
        ProductCatalog::new(f.store.clone())
            .create(tee(f.audio, false))
            .await
            .unwrap();

        assert!(matches!(
            f.service.product("logo-tee").await,
            Err(CatalogError::NotFound(_))
        ));
        let page = f.service.category_page("audio").await.unwrap();
        assert!(page.products.is_empty());
    }

    #[tokio::test]
    async fn test_nav_is_cached_until_ttl() {
        let f = fixture().await;
        assert_eq!(f.service.nav().await.unwrap().len(), 1);

        CategoryTree::new(f.store.clone())
            .create(category("Books", None))
            .await
            .unwrap();

        // Still served from cache.
        assert_eq!(f.service.nav().await.unwrap().len(), 1);

        let fresh = CatalogService::new(f.store.clone(), Duration::from_secs(300));
        assert_eq!(fresh.nav().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_tree_nests_children() {
        let f = fixture().await;
        CategoryTree::new(f.store.clone())
            .create(category("Headphones", Some(f.audio)))
            .await
            .unwrap();

        let tree = f.service.tree().await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].category.name, "Headphones");
    }

    #[tokio::test]
    async fn test_review_flow() {
        let f = fixture().await;
        ProductCatalog::new(f.store.clone())
            .create(tee(f.audio, true))
            .await
            .unwrap();

        let input = || ReviewInput {
            rating: 4,
            title: "Great fit".into(),
            comment: "Washes well.".into(),
        };
        let review = f.service.add_review(&shopper(), "logo-tee", input()).await.unwrap();
        assert_eq!(review.author_name, "Lin");

        assert!(matches!(
            f.service.add_review(&shopper(), "logo-tee", input()).await,
            Err(CatalogError::AlreadyReviewed)
        ));
        assert_eq!(f.service.reviews("logo-tee").await.unwrap().len(), 1);
        assert_eq!(f.service.recent_reviews().await.unwrap().len(), 1);

        let detail = f.service.product("logo-tee").await.unwrap();
        assert_eq!(detail.product.rating.count, 1);
    }

    fn simple(name: &str, category: CategoryId, base: i64, sale: Option<i64>) -> ProductInput {
        ProductInput {
            name: name.to_owned(),
            description: format!("{name} description"),
            base_price: Decimal::new(base, 0),
            sale_price: sale.map(|s| Decimal::new(s, 0)),
            category_id: category,
            media: vec![ProductMedia::image("https://cdn.example.com/p.jpg")],
            is_active: true,
            variants: Vec::new(),
        }
    }

    /// Tee (audio, 100 on sale for 80), Poster (books, 30), Desk Lamp
    /// (home, 50), Old Stock (audio, 10, inactive), created in that order.
    async fn shop(f: &Fixture) -> (CategoryId, CategoryId) {
        let tree = CategoryTree::new(f.store.clone());
        let books = tree.create(category("Books", None)).await.unwrap().id;
        let home = tree.create(category("Home", None)).await.unwrap().id;

        let catalog = ProductCatalog::new(f.store.clone());
        catalog.create(tee(f.audio, true)).await.unwrap();
        catalog.create(simple("Poster", books, 30, None)).await.unwrap();
        catalog.create(simple("Desk Lamp", home, 50, None)).await.unwrap();
        let mut old = simple("Old Stock", f.audio, 10, None);
        old.is_active = false;
        catalog.create(old).await.unwrap();
        (books, home)
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_listing_is_active_only_and_newest_first() {
        let f = fixture().await;
        shop(&f).await;

        let all = f.service.products(ProductFilter::default()).await.unwrap();
        assert_eq!(names(&all), ["Desk Lamp", "Poster", "Logo Tee"]);
    }

    #[tokio::test]
    async fn test_listing_by_several_categories() {
        let f = fixture().await;
        let (books, _) = shop(&f).await;

        let filter = ProductFilter {
            categories: vec![f.audio, books],
            ..ProductFilter::default()
        };
        let found = f.service.products(filter).await.unwrap();
        assert_eq!(names(&found), ["Poster", "Logo Tee"]);
    }

    #[tokio::test]
    async fn test_listing_by_effective_price_range() {
        let f = fixture().await;
        shop(&f).await;

        // The tee lists at 100 but sells for 80, so it is inside the range.
        let filter = ProductFilter {
            min_price: Some(Decimal::new(40, 0)),
            max_price: Some(Decimal::new(80, 0)),
            ..ProductFilter::default()
        };
        let found = f.service.products(filter).await.unwrap();
        assert_eq!(names(&found), ["Desk Lamp", "Logo Tee"]);

        let under = ProductFilter {
            max_price: Some(Decimal::new(30, 0)),
            ..ProductFilter::default()
        };
        assert_eq!(names(&f.service.products(under).await.unwrap()), ["Poster"]);
    }

    #[tokio::test]
    async fn test_inverted_price_range_is_rejected() {
        let f = fixture().await;
        let filter = ProductFilter {
            min_price: Some(Decimal::new(50, 0)),
            max_price: Some(Decimal::new(10, 0)),
            ..ProductFilter::default()
        };
        assert!(matches!(
            f.service.products(filter).await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_on_sale_only() {
        let f = fixture().await;
        shop(&f).await;

        let filter = ProductFilter {
            on_sale: true,
            ..ProductFilter::default()
        };
        assert_eq!(names(&f.service.products(filter).await.unwrap()), ["Logo Tee"]);
    }

    #[tokio::test]
    async fn test_listing_limit_keeps_newest() {
        let f = fixture().await;
        shop(&f).await;

        let filter = ProductFilter {
            limit: Some(2),
            ..ProductFilter::default()
        };
        assert_eq!(
            names(&f.service.products(filter).await.unwrap()),
            ["Desk Lamp", "Poster"]
        );
    }

    #[tokio::test]
    async fn test_unknown_category_slug() {
        let f = fixture().await;
        assert!(matches!(
            f.service.category_page("nope").await,
            Err(CatalogError::NotFound(_))
        ));
    }
}
