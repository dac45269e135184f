//! Homepage marketing banners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};
use crate::types::BannerId;

/// A stored banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    /// Where the banner links to, e.g. `/products/summer-collection`.
    pub link: Option<String>,
    pub image: String,
    pub is_active: bool,
    /// Sort key; lower comes first.
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_active() -> bool {
    true
}

/// Admin-supplied banner fields.
#[derive(Debug, Clone, Deserialize)]
pub struct BannerInput {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    pub image: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub position: i32,
}

impl BannerInput {
    /// Trim fields, drop an empty link and reject missing values.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the title or image is empty.
    pub fn normalized(self) -> CatalogResult<Self> {
        let title = self.title.trim().to_owned();
        let image = self.image.trim().to_owned();
        let link = self
            .link
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty());

        if title.is_empty() {
            return Err(CatalogError::validation("Banner title is required."));
        }
        if image.is_empty() {
            return Err(CatalogError::validation("Banner image is required."));
        }

        Ok(Self {
            title,
            link,
            image,
            is_active: self.is_active,
            position: self.position,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_trimming() {
        let input: BannerInput = serde_json::from_str(
            r#"{"title": " Summer Sale ", "link": "  ", "image": "https://cdn.example.com/b.jpg"}"#,
        )
        .unwrap();
        let input = input.normalized().unwrap();
        assert_eq!(input.title, "Summer Sale");
        assert_eq!(input.link, None);
        assert!(input.is_active);
        assert_eq!(input.position, 0);
    }

    #[test]
    fn test_title_required() {
        let input = BannerInput {
            title: String::new(),
            link: None,
            image: "https://cdn.example.com/b.jpg".into(),
            is_active: true,
            position: 0,
        };
        assert_eq!(input.normalized().unwrap_err().to_string(), "Banner title is required.");
    }
}
