//! Catalog rules: categories, products, variants and reviews.
//!
//! The services here ([`CategoryTree`], [`ProductCatalog`], [`ReviewBoard`])
//! own the invariants; persistence goes through the traits in [`store`].
//! Variant resolution and pricing are pure functions over loaded data.

pub mod category;
pub mod memory;
pub mod pricing;
pub mod product;
pub mod review;
pub mod slug;
pub mod store;
pub mod variant;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use category::{AncestorRef, Category, CategoryInput, CategoryNode, CategoryRecord, CategoryTree};
pub use memory::MemoryStore;
pub use pricing::{effective_price, resolve_price};
pub use product::{
    MediaKind, Product, ProductCatalog, ProductFilter, ProductInput, ProductMedia, ProductRecord,
};
pub use review::{NewReview, Rating, RatingSummary, Review, ReviewBoard, ReviewInput};
pub use store::{CategoryStore, ProductStore, ReviewStore, SlugIndex};
pub use variant::{
    Dimensions, NewVariant, OptionAssignment, OptionAxes, OptionAxis, OptionSet, Resolution,
    Selection, Variant, collect_option_axes, default_selection, resolve_variant,
    validate_variants,
};

#[cfg(feature = "postgres")]
pub use postgres::PgCatalogStore;
