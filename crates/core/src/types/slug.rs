//! URL slugs derived from display names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe identifier derived from a human-readable name.
///
/// Slugs are produced by [`Slug::base_from_name`] and made unique by
/// appending a numeric suffix ([`Slug::with_suffix`]). The catalog never
/// parses user-supplied slugs into this type, so there is no validation on
/// construction beyond what the derivation guarantees.
///
/// ## Examples
///
/// ```
/// use emporium_core::Slug;
///
/// let base = Slug::base_from_name("Coffee Makers & Grinders");
/// assert_eq!(base.as_str(), "coffee-makers--grinders");
/// assert_eq!(base.with_suffix(2).as_str(), "coffee-makers--grinders-2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive the base slug for a name.
    ///
    /// Lower-cases the name, turns every whitespace character into `-`, then
    /// drops anything that is not an ASCII letter, digit, `_` or `-`. The
    /// result may be empty (e.g. for a name made only of punctuation).
    #[must_use]
    pub fn base_from_name(name: &str) -> Self {
        let slug = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() { '-' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        Self(slug)
    }

    /// The `n`th collision candidate: `base-n`.
    #[must_use]
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// Wrap a slug already read back from storage.
    #[must_use]
    pub const fn from_stored(slug: String) -> Self {
        Self(slug)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the derivation produced nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the slug and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(Slug::base_from_name("Home Goods").as_str(), "home-goods");
        assert_eq!(Slug::base_from_name("Tab\tSeparated").as_str(), "tab-separated");
    }

    #[test]
    fn strips_non_word_characters() {
        assert_eq!(Slug::base_from_name("T-Shirts (Men's)!").as_str(), "t-shirts-mens");
        assert_eq!(Slug::base_from_name("snake_case ok").as_str(), "snake_case-ok");
        assert_eq!(Slug::base_from_name("Café Crème").as_str(), "caf-crme");
    }

    #[test]
    fn punctuation_only_name_gives_empty_slug() {
        let slug = Slug::base_from_name("!!!");
        assert!(slug.is_empty());
        assert_eq!(slug.with_suffix(1).as_str(), "-1");
    }
}
