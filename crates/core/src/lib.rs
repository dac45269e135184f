//! Emporium Core - Catalog types and rules.
//!
//! This crate provides the pieces shared by all Emporium components:
//! - `storefront` - Public-facing JSON API
//! - `admin` - Back-office JSON API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The catalog rules (category tree, variant resolution, pricing, reviews) are
//! written against the storage traits in [`catalog::store`]. Two stores ship
//! with the crate: [`catalog::MemoryStore`] for tests and dry runs, and
//! `catalog::PgCatalogStore`, compiled in with the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, slugs and permissions
//! - [`catalog`] - Categories, products, variants and reviews
//! - [`content`] - Banners and store settings
//! - [`error`] - The catalog error taxonomy
//! - `auth` - Bearer token verification (feature `auth`)
//! - `config` - Environment helpers and shared settings (feature `auth`)
//! - `telemetry` - Sentry, tracing subscriber and shutdown signal (feature `telemetry`)

#![cfg_attr(not(test), forbid(unsafe_code))]

#[cfg(feature = "auth")]
pub mod auth;
pub mod catalog;
#[cfg(feature = "auth")]
pub mod config;
pub mod content;
pub mod error;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod types;

pub use error::{CatalogError, ConflictKind, StoreError};
pub use types::*;
