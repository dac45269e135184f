//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use emporium_core::auth::TokenVerifier;
use emporium_core::catalog::{CategoryTree, PgCatalogStore, ProductCatalog, ReviewBoard};
use emporium_core::content::PgContentStore;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    verifier: TokenVerifier,
    categories: CategoryTree<PgCatalogStore>,
    products: ProductCatalog<PgCatalogStore>,
    reviews: ReviewBoard<PgCatalogStore>,
    content: PgContentStore,
}

impl AppState {
    /// Build the state around an open pool.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let store = PgCatalogStore::new(pool.clone());
        let verifier = config.auth.verifier();

        Self {
            inner: Arc::new(AppStateInner {
                verifier,
                categories: CategoryTree::new(store.clone()),
                products: ProductCatalog::new(store.clone()),
                reviews: ReviewBoard::new(store),
                content: PgContentStore::new(pool.clone()),
                config,
                pool,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryTree<PgCatalogStore> {
        &self.inner.categories
    }

    #[must_use]
    pub fn products(&self) -> &ProductCatalog<PgCatalogStore> {
        &self.inner.products
    }

    #[must_use]
    pub fn reviews(&self) -> &ReviewBoard<PgCatalogStore> {
        &self.inner.reviews
    }

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
