//! Domain models owned by the admin API.
//!
//! Catalog and content types live in `emporium_core`; only roles are
//! specific to the back office.

pub mod role;

pub use role::{Role, RoleInput};
