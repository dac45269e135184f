//! `PostgreSQL` storage for banners and settings.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::error::{CatalogResult, StoreError};
use crate::types::BannerId;

use super::banner::{Banner, BannerInput};
use super::settings::{SettingsPatch, StoreSettings};

#[derive(Debug, sqlx::FromRow)]
struct BannerRow {
    id: i32,
    title: String,
    link: Option<String>,
    image: String,
    is_active: bool,
    position: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BannerRow> for Banner {
    fn from(row: BannerRow) -> Self {
        Self {
            id: BannerId::new(row.id),
            title: row.title,
            link: row.link,
            image: row.image,
            is_active: row.is_active,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BANNER_COLUMNS: &str = "id, title, link, image, is_active, position, created_at, updated_at";

/// Banner and settings storage.
#[derive(Debug, Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Banners in display order. `active_only` hides switched-off banners.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_banners(&self, active_only: bool) -> Result<Vec<Banner>, StoreError> {
        let rows = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM banner
             WHERE NOT $1 OR is_active
             ORDER BY position, created_at DESC"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_banner(&self, id: BannerId) -> Result<Option<Banner>, StoreError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "SELECT {BANNER_COLUMNS} FROM banner WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Insert a normalized banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn create_banner(&self, input: &BannerInput) -> Result<Banner, StoreError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "INSERT INTO banner (title, link, image, is_active, position)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(input.link.as_deref())
        .bind(&input.image)
        .bind(input.is_active)
        .bind(input.position)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Overwrite a banner. `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn update_banner(
        &self,
        id: BannerId,
        input: &BannerInput,
    ) -> Result<Option<Banner>, StoreError> {
        let row = sqlx::query_as::<_, BannerRow>(&format!(
            "UPDATE banner
             SET title = $2, link = $3, image = $4, is_active = $5, position = $6,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(&input.title)
        .bind(input.link.as_deref())
        .bind(&input.image)
        .bind(input.is_active)
        .bind(input.position)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn delete_banner(&self, id: BannerId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM banner WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The settings document, with defaults for anything not stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored document is not an
    /// object.
    pub async fn settings(&self) -> Result<StoreSettings, StoreError> {
        let document = sqlx::query_scalar::<_, Json<serde_json::Value>>(
            "SELECT document FROM settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        match document {
            Some(Json(value)) => serde_json::from_value(value)
                .map_err(|e| StoreError::DataCorruption(format!("invalid settings document: {e}"))),
            None => Ok(StoreSettings::default()),
        }
    }

    /// Apply `patch` to the stored settings and return the result.
    ///
    /// The row is locked for the read-modify-write, so concurrent patches of
    /// different fields are all kept.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the patched settings are invalid
    /// (nothing is written), or a store error.
    pub async fn update_settings(&self, patch: SettingsPatch) -> CatalogResult<StoreSettings> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query("INSERT INTO settings (id, document) VALUES (1, '{}') ON CONFLICT (id) DO NOTHING")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        let Json(current) = sqlx::query_scalar::<_, Json<serde_json::Value>>(
            "SELECT document FROM settings WHERE id = 1 FOR UPDATE",
        )
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::from)?;
        let current: StoreSettings = serde_json::from_value(current)
            .map_err(|e| StoreError::DataCorruption(format!("invalid settings document: {e}")))?;

        let settings = patch.apply(current)?;

        sqlx::query("UPDATE settings SET document = $1, updated_at = NOW() WHERE id = 1")
            .bind(Json(&settings))
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        tx.commit().await.map_err(StoreError::from)?;

        Ok(settings)
    }
}
