//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. CORS

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{CustomerAuthRejection, RequireCustomer};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
