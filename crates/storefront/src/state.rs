//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use emporium_core::auth::TokenVerifier;
use emporium_core::catalog::PgCatalogStore;
use emporium_core::content::PgContentStore;

use crate::config::StorefrontConfig;
use crate::services::CatalogService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    verifier: TokenVerifier,
    catalog: CatalogService<PgCatalogStore>,
    content: PgContentStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let catalog = CatalogService::new(PgCatalogStore::new(pool.clone()), config.cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                verifier: config.auth.verifier(),
                content: PgContentStore::new(pool.clone()),
                catalog,
                config,
                pool,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Catalog reads, variant resolution and reviews.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService<PgCatalogStore> {
        &self.inner.catalog
    }

    /// Banners and store settings.
    #[must_use]
    pub fn content(&self) -> &PgContentStore {
        &self.inner.content
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.inner.verifier.clone()
    }
}
