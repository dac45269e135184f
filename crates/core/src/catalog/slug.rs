//! Collision-free slug generation.

use tracing::debug;

use crate::error::{CatalogError, CatalogResult};
use crate::types::Slug;

use super::store::SlugIndex;

/// Upper bound on `-n` suffixes tried before giving up.
const MAX_SUFFIX: u32 = 10_000;

/// Find a slug for `name` that is free or already owned by `exclude`.
///
/// Probes `base`, `base-1`, `base-2`, ... against the store. The answer is
/// only valid at the moment of the check: a concurrent writer can claim the
/// same slug before ours lands, which the store reports as a slug conflict.
///
/// # Errors
///
/// Returns `CatalogError::Store` if a lookup fails, or
/// `CatalogError::SlugConflict` if every suffix up to the limit is taken.
pub async fn unique_slug<S, I>(store: &S, name: &str, exclude: Option<I>) -> CatalogResult<Slug>
where
    S: SlugIndex<I>,
    I: PartialEq + Send,
{
    let base = Slug::base_from_name(name);
    let mut candidate = base.clone();
    let mut suffix = 0;

    loop {
        match store.slug_owner(candidate.as_str()).await? {
            None => return Ok(candidate),
            Some(owner) if exclude.as_ref() == Some(&owner) => return Ok(candidate),
            Some(_) => {
                suffix += 1;
                if suffix > MAX_SUFFIX {
                    return Err(CatalogError::SlugConflict(base.into_inner()));
                }
                debug!(slug = %candidate, "slug taken, probing next suffix");
                candidate = base.with_suffix(suffix);
            }
        }
    }
}
