//! Catalog error taxonomy.

use thiserror::Error;

use crate::types::{CategoryId, ProductId};

/// Which uniqueness constraint a write tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// `category.slug` or `product.slug`.
    Slug,
    /// Two categories with the same name under one parent.
    SiblingName,
    /// A second review by the same user for the same product.
    Review,
    /// Any other unique constraint (role name, SKU, ...).
    Other,
}

/// Errors reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("constraint violation ({kind:?}): {message}")]
    Conflict {
        kind: ConflictKind,
        message: String,
    },

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The backend itself failed (connection, query, ...).
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Shorthand for a conflict of the given kind.
    pub fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
        Self::Conflict {
            kind,
            message: message.into(),
        }
    }

    /// The conflict kind, if this is a conflict.
    #[must_use]
    pub const fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Conflict { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Errors produced by the catalog rules.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input rejected before any write was attempted.
    #[error("{0}")]
    Validation(String),

    /// The slug was still taken after every regeneration attempt.
    #[error("slug already in use: {0}")]
    SlugConflict(String),

    /// The user already left a review for this product.
    #[error("You have already reviewed this product.")]
    AlreadyReviewed,

    /// Some other uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The requested parent category does not exist.
    #[error("parent category {0} not found")]
    ParentNotFound(CategoryId),

    /// The referenced category does not exist.
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    /// The referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Any other missing entity.
    #[error("{0} not found")]
    NotFound(String),

    /// The new parent would make the category its own ancestor.
    #[error("category {category} cannot be moved under {parent}: it would become its own ancestor")]
    CycleDetected {
        category: CategoryId,
        parent: CategoryId,
    },

    /// The category still has child categories.
    #[error("category {0} still has subcategories")]
    HasChildren(CategoryId),

    /// The category is still referenced by products.
    #[error("category {0} still has products")]
    InUse(CategoryId),

    /// The storage backend failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the caller sent something wrong (as opposed to a server fault).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
