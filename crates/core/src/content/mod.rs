//! Store content managed from the back office: marketing banners and the
//! store settings document.

pub mod banner;
pub mod settings;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use banner::{Banner, BannerInput};
pub use settings::{SettingsPatch, Socials, SocialsPatch, StoreSettings, Theme};

#[cfg(feature = "postgres")]
pub use postgres::PgContentStore;
