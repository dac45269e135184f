//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Read side of the catalog, variant resolution and reviews

pub mod catalog;

pub use catalog::{CatalogService, CategoryPage, ProductDetail, VariantChoice};
