//! `PostgreSQL` catalog store.
//!
//! Queries are built at runtime (`query_as` with `FromRow` rows), so the crate
//! compiles without a database. Unique and foreign-key violations are
//! translated into [`StoreError::Conflict`] by constraint name; the names
//! match `crates/core/migrations`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{ConflictKind, StoreError};
use crate::types::{CategoryId, ProductId, ReviewId, Slug, UserId, VariantId};

use super::category::{AncestorRef, Category, CategoryRecord};
use super::product::{Product, ProductFilter, ProductMedia, ProductRecord};
use super::review::{NewReview, Rating, RatingSummary, Review};
use super::store::{CategoryStore, ProductStore, ReviewStore, SlugIndex};
use super::variant::{Dimensions, OptionAssignment, Variant};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation() {
                let constraint = db.constraint().unwrap_or_default().to_owned();
                let kind = match constraint.as_str() {
                    "category_slug_key" | "product_slug_key" => ConflictKind::Slug,
                    "category_parent_name_key" => ConflictKind::SiblingName,
                    "review_product_user_key" => ConflictKind::Review,
                    _ => ConflictKind::Other,
                };
                return Self::conflict(kind, constraint);
            }
        }
        Self::Backend(Box::new(err))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    image: String,
    parent_id: Option<i32>,
    ancestors: Json<Vec<AncestorRef>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            description: row.description,
            image: row.image,
            parent: row.parent_id.map(CategoryId::new),
            ancestors: row.ancestors.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    description: String,
    base_price: Decimal,
    sale_price: Option<Decimal>,
    category_id: i32,
    media: Json<Vec<ProductMedia>>,
    is_active: bool,
    rating_count: i64,
    rating_average: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<Variant>) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            slug: Slug::from_stored(self.slug),
            description: self.description,
            base_price: self.base_price,
            sale_price: self.sale_price,
            category_id: CategoryId::new(self.category_id),
            media: self.media.0,
            is_active: self.is_active,
            variants,
            rating: RatingSummary {
                count: self.rating_count,
                average: self.rating_average,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    sku: String,
    price_override: Option<Decimal>,
    stock: i32,
    weight_grams: Option<i32>,
    dimensions: Option<Json<Dimensions>>,
    options: Json<Vec<OptionAssignment>>,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Self {
            id: VariantId::new(row.id),
            sku: row.sku,
            price_override: row.price_override,
            stock: row.stock,
            weight_grams: row.weight_grams,
            dimensions: row.dimensions.map(|d| d.0),
            options: row.options.0,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    product_id: i32,
    user_id: i32,
    author_name: String,
    rating: i16,
    title: String,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating = Rating::try_from(i32::from(row.rating)).map_err(|_| {
            StoreError::DataCorruption(format!("review {} has rating {}", row.id, row.rating))
        })?;

        Ok(Self {
            id: ReviewId::new(row.id),
            product_id: ProductId::new(row.product_id),
            user_id: UserId::new(row.user_id),
            author_name: row.author_name,
            rating,
            title: row.title,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, image, parent_id, ancestors, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, name, slug, description, base_price, sale_price, category_id, \
     media, is_active, rating_count, rating_average, created_at, updated_at";

/// A sale price only counts while it undercuts the base price.
const ON_SALE: &str = "(sale_price IS NOT NULL AND sale_price < base_price)";

const EFFECTIVE_PRICE: &str =
    "(CASE WHEN sale_price IS NOT NULL AND sale_price < base_price THEN sale_price ELSE base_price END)";

const VARIANT_COLUMNS: &str =
    "id, product_id, sku, price_override, stock, weight_grams, dimensions, options";

const REVIEW_COLUMNS: &str =
    "id, product_id, user_id, author_name, rating, title, comment, created_at";

// =============================================================================
// Store
// =============================================================================

/// Catalog store on a `PostgreSQL` pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load the variants of several products, grouped by product.
    async fn variants_for(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<Variant>>, StoreError> {
        let rows = sqlx::query_as::<_, VariantRow>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variant
             WHERE product_id = ANY($1)
             ORDER BY product_id, position"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i32, Vec<Variant>> = HashMap::new();
        for row in rows {
            grouped.entry(row.product_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, StoreError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut variants = self.variants_for(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let own = variants.remove(&row.id).unwrap_or_default();
                row.into_product(own)
            })
            .collect())
    }

    async fn product_where(&self, clause: &str, bind: ProductKey<'_>) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE {clause}");
        let query = sqlx::query_as::<_, ProductRow>(&sql);
        let row = match bind {
            ProductKey::Id(id) => query.bind(id.as_i32()),
            ProductKey::Slug(slug) => query.bind(slug),
        }
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert_variants(
        tx: &mut Transaction<'_, Postgres>,
        product: i32,
        record: &ProductRecord,
    ) -> Result<(), StoreError> {
        for (position, variant) in record.variants.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::DataCorruption("too many variants".to_owned()))?;
            sqlx::query(
                "INSERT INTO product_variant
                    (product_id, position, sku, price_override, stock, weight_grams, dimensions, options)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(product)
            .bind(position)
            .bind(&variant.sku)
            .bind(variant.price_override)
            .bind(variant.stock)
            .bind(variant.weight_grams)
            .bind(variant.dimensions.map(Json))
            .bind(Json(&variant.options))
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

enum ProductKey<'a> {
    Id(ProductId),
    Slug(&'a str),
}

impl SlugIndex<CategoryId> for PgCatalogStore {
    async fn slug_owner(&self, slug: &str) -> Result<Option<CategoryId>, StoreError> {
        let id = sqlx::query_scalar::<_, i32>("SELECT id FROM category WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(CategoryId::new))
    }
}

impl SlugIndex<ProductId> for PgCatalogStore {
    async fn slug_owner(&self, slug: &str) -> Result<Option<ProductId>, StoreError> {
        let id = sqlx::query_scalar::<_, i32>("SELECT id FROM product WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id.map(ProductId::new))
    }
}

impl CategoryStore for PgCatalogStore {
    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_category(&self, record: &CategoryRecord) -> Result<Category, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "INSERT INTO category (name, slug, description, image, parent_id, ancestors)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(&record.description)
        .bind(&record.image)
        .bind(record.parent.map(|p| p.as_i32()))
        .bind(Json(&record.ancestors))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: CategoryId,
        record: &CategoryRecord,
    ) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!(
            "UPDATE category
             SET name = $2, slug = $3, description = $4, image = $5,
                 parent_id = $6, ancestors = $7, updated_at = NOW()
             WHERE id = $1
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(&record.description)
        .bind(&record.image)
        .bind(record.parent.map(|p| p.as_i32()))
        .bind(Json(&record.ancestors))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_children(&self, id: CategoryId) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM category WHERE parent_id = $1")
            .bind(id.as_i32())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn category_in_use(&self, id: CategoryId) -> Result<bool, StoreError> {
        let used = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM product WHERE category_id = $1)",
        )
        .bind(id.as_i32())
        .fetch_one(&self.pool)
        .await?;
        Ok(used)
    }
}

impl ProductStore for PgCatalogStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.product_where("id = $1", ProductKey::Id(id)).await
    }

    async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        self.product_where("slug = $1", ProductKey::Slug(slug)).await
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let categories: Vec<i32> = filter.categories.iter().map(CategoryId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             WHERE (cardinality($1::INTEGER[]) = 0 OR category_id = ANY($1))
               AND (NOT $2 OR is_active)
               AND ($3::NUMERIC IS NULL OR {EFFECTIVE_PRICE} >= $3)
               AND ($4::NUMERIC IS NULL OR {EFFECTIVE_PRICE} <= $4)
               AND (NOT $5 OR {ON_SALE})
             ORDER BY created_at DESC, id DESC
             LIMIT $6"
        ))
        .bind(&categories)
        .bind(filter.active_only)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.on_sale)
        .bind(filter.limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?;
        self.hydrate(rows).await
    }

    async fn insert_product(&self, record: &ProductRecord) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO product
                (name, slug, description, base_price, sale_price, category_id, media, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(&record.description)
        .bind(record.base_price)
        .bind(record.sale_price)
        .bind(record.category_id.as_i32())
        .bind(Json(&record.media))
        .bind(record.is_active)
        .fetch_one(&mut *tx)
        .await?;
        Self::insert_variants(&mut tx, id, record).await?;
        tx.commit().await?;

        self.get_product(ProductId::new(id))
            .await?
            .ok_or_else(|| StoreError::DataCorruption(format!("product {id} vanished after insert")))
    }

    async fn update_product(
        &self,
        id: ProductId,
        record: &ProductRecord,
    ) -> Result<Option<Product>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE product
             SET name = $2, slug = $3, description = $4, base_price = $5, sale_price = $6,
                 category_id = $7, media = $8, is_active = $9, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id.as_i32())
        .bind(&record.name)
        .bind(record.slug.as_str())
        .bind(&record.description)
        .bind(record.base_price)
        .bind(record.sale_price)
        .bind(record.category_id.as_i32())
        .bind(Json(&record.media))
        .bind(record.is_active)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("DELETE FROM product_variant WHERE product_id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;
        Self::insert_variants(&mut tx, id.as_i32(), record).await?;
        tx.commit().await?;

        self.get_product(id).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_product_rating(&self, id: ProductId, summary: RatingSummary) -> Result<(), StoreError> {
        sqlx::query("UPDATE product SET rating_count = $2, rating_average = $3 WHERE id = $1")
            .bind(id.as_i32())
            .bind(summary.count)
            .bind(summary.average)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl ReviewStore for PgCatalogStore {
    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, StoreError> {
        sqlx::query_as::<_, ReviewRow>(&format!("SELECT {REVIEW_COLUMNS} FROM review WHERE id = $1"))
            .bind(id.as_i32())
            .fetch_optional(&self.pool)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_review(&self, user: UserId, product: ProductId) -> Result<Option<Review>, StoreError> {
        sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM review WHERE user_id = $1 AND product_id = $2"
        ))
        .bind(user.as_i32())
        .bind(product.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .map(TryInto::try_into)
        .transpose()
    }

    async fn insert_review(&self, review: &NewReview) -> Result<Review, StoreError> {
        sqlx::query_as::<_, ReviewRow>(&format!(
            "INSERT INTO review (product_id, user_id, author_name, rating, title, comment)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(review.product_id.as_i32())
        .bind(review.user_id.as_i32())
        .bind(&review.author_name)
        .bind(i16::from(review.rating.get()))
        .bind(&review.title)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM review WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for_product(&self, product: ProductId) -> Result<Vec<Review>, StoreError> {
        sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM review
             WHERE product_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(product.as_i32())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
    }

    async fn recent_reviews(&self, limit: i64) -> Result<Vec<Review>, StoreError> {
        sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM review
             ORDER BY created_at DESC, id DESC
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TryInto::try_into)
        .collect()
    }

    async fn rating_summary(&self, product: ProductId) -> Result<RatingSummary, StoreError> {
        let (count, average) = sqlx::query_as::<_, (i64, f64)>(
            "SELECT COUNT(*), COALESCE(AVG(rating)::DOUBLE PRECISION, 0)
             FROM review WHERE product_id = $1",
        )
        .bind(product.as_i32())
        .fetch_one(&self.pool)
        .await?;
        Ok(RatingSummary { count, average })
    }
}
