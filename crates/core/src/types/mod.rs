//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod permission;
pub mod price;
pub mod slug;

pub use id::*;
pub use permission::{Permission, PermissionSet, PredefinedRole, predefined_roles};
pub use price::{CurrencyCode, Price};
pub use slug::Slug;
