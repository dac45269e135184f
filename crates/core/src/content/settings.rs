//! The store settings document.
//!
//! Stored as a single JSON document. Keys missing from the stored document
//! take their default value when read, so new settings can be added without
//! a data migration.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Colour scheme of the storefront.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Social profile URLs shown in the footer. Empty means "not shown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Socials {
    pub facebook: String,
    pub instagram: String,
    pub twitter: String,
    pub youtube: String,
}

/// Store-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub store_name: String,
    pub contact_email: String,
    pub store_address: String,
    pub phone: String,
    pub whatsapp: String,
    pub socials: Socials,
    pub theme: Theme,
    pub font: String,
    /// CSS hex colour, e.g. `#2563eb`.
    pub primary_color: String,
    pub logo_url: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "BlueCart".to_owned(),
            contact_email: "sales@bluecart.com".to_owned(),
            store_address: "123 Market St, San Francisco, CA 94103".to_owned(),
            phone: String::new(),
            whatsapp: String::new(),
            socials: Socials::default(),
            theme: Theme::Light,
            font: "inter".to_owned(),
            primary_color: "#2563eb".to_owned(),
            logo_url: String::new(),
        }
    }
}

/// Partial update of [`Socials`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocialsPatch {
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub youtube: Option<String>,
}

/// Partial update of [`StoreSettings`]. Absent fields are left unchanged;
/// an empty string clears a field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsPatch {
    pub store_name: Option<String>,
    pub contact_email: Option<String>,
    pub store_address: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub socials: Option<SocialsPatch>,
    pub theme: Option<Theme>,
    pub font: Option<String>,
    pub primary_color: Option<String>,
    pub logo_url: Option<String>,
}

fn set(field: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *field = value.trim().to_owned();
    }
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

impl SettingsPatch {
    /// Apply the patch to `settings` and return the result.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for an empty store name, a contact
    /// email without `@`, or a primary colour that is not a hex colour.
    pub fn apply(self, mut settings: StoreSettings) -> CatalogResult<StoreSettings> {
        set(&mut settings.store_name, self.store_name);
        set(&mut settings.contact_email, self.contact_email);
        set(&mut settings.store_address, self.store_address);
        set(&mut settings.phone, self.phone);
        set(&mut settings.whatsapp, self.whatsapp);
        set(&mut settings.font, self.font);
        set(&mut settings.primary_color, self.primary_color);
        set(&mut settings.logo_url, self.logo_url);
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(socials) = self.socials {
            set(&mut settings.socials.facebook, socials.facebook);
            set(&mut settings.socials.instagram, socials.instagram);
            set(&mut settings.socials.twitter, socials.twitter);
            set(&mut settings.socials.youtube, socials.youtube);
        }

        if settings.store_name.is_empty() {
            return Err(CatalogError::validation("Store name is required."));
        }
        if !settings.contact_email.is_empty() && !settings.contact_email.contains('@') {
            return Err(CatalogError::validation("Contact email is not valid."));
        }
        if !is_hex_color(&settings.primary_color) {
            return Err(CatalogError::validation(
                "Primary color must be a hex color such as #2563eb.",
            ));
        }
        Ok(settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let stored: StoreSettings =
            serde_json::from_str(r#"{"store_name": "Acme", "socials": {"instagram": "acme"}}"#)
                .unwrap();
        assert_eq!(stored.store_name, "Acme");
        assert_eq!(stored.primary_color, "#2563eb");
        assert_eq!(stored.socials.instagram, "acme");
        assert_eq!(stored.socials.facebook, "");
        assert_eq!(stored.theme, Theme::Light);
    }

    #[test]
    fn test_patch_touches_only_given_fields() {
        let patch = SettingsPatch {
            phone: Some(" +1 555 0100 ".into()),
            socials: Some(SocialsPatch {
                youtube: Some("https://youtube.com/@bluecart".into()),
                ..SocialsPatch::default()
            }),
            theme: Some(Theme::Dark),
            ..SettingsPatch::default()
        };
        let updated = patch.apply(StoreSettings::default()).unwrap();
        assert_eq!(updated.phone, "+1 555 0100");
        assert_eq!(updated.socials.youtube, "https://youtube.com/@bluecart");
        assert_eq!(updated.theme, Theme::Dark);
        assert_eq!(updated.store_name, "BlueCart");
    }

    #[test]
    fn test_patch_validation() {
        let blank_name = SettingsPatch {
            store_name: Some("  ".into()),
            ..SettingsPatch::default()
        };
        assert!(blank_name.apply(StoreSettings::default()).is_err());

        let bad_color = SettingsPatch {
            primary_color: Some("blue".into()),
            ..SettingsPatch::default()
        };
        assert!(bad_color.apply(StoreSettings::default()).is_err());

        let short_color = SettingsPatch {
            primary_color: Some("#fff".into()),
            ..SettingsPatch::default()
        };
        assert!(short_color.apply(StoreSettings::default()).is_ok());
    }
}
