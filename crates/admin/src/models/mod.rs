//! Domain models for admin.

pub mod session;
pub mod site_config;

pub use session::keys;
pub use site_config::{
    ConnectionSecurity, EmailSettings, FieldError, LogSettings, PrivacySettings,
    REDACTED_SETTING, ServiceSettings, SiteConfig, TeamSettings, ValidationErrors,
};
