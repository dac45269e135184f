//! HTTP middleware and extractors for admin.
//!
//! # Layer Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. `RequireAdmin` extractor on every `/api` handler

pub mod auth;

pub use auth::{RequireAdmin, require_permission};
