//! The site configuration document.
//!
//! Operators read and replace the whole document; it is never patched field
//! by field. Secrets leave the server only as [`REDACTED_SETTING`] and are
//! restored from the stored document when a redacted copy is saved back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use huddle_core::Email;

/// Placeholder that stands in for a secret in documents sent to clients.
pub const REDACTED_SETTING: &str = "********";

const MAX_SITE_NAME_LENGTH: usize = 30;
const LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARN", "ERROR"];

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `team_settings.site_name`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every failing field of a rejected document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` is among the failures.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Transport security towards the SMTP relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSecurity {
    /// Plain connection, no encryption.
    None,
    /// Implicit TLS.
    Tls,
    /// Upgrade with STARTTLS.
    #[default]
    Starttls,
}

impl ConnectionSecurity {
    /// Port used when the document leaves `smtp_port` at 0.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::Tls => 465,
            Self::Starttls => 587,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Public URL of the site; empty means "derive from the request".
    pub site_url: String,
    pub listen_address: String,
    pub enable_incoming_webhooks: bool,
    pub enable_outgoing_webhooks: bool,
    pub enable_commands: bool,
    pub session_length_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSettings {
    pub site_name: String,
    pub max_users_per_team: u32,
    pub enable_team_creation: bool,
    pub enable_user_creation: bool,
    /// Comma-separated email domains allowed to sign up; empty allows all.
    pub restrict_creation_to_domains: String,
}

/// SMTP and notification settings.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSettings {
    pub enable_sign_up_with_email: bool,
    pub send_email_notifications: bool,
    pub require_email_verification: bool,
    /// Sender display name; defaults to the site name.
    pub feedback_name: String,
    pub feedback_email: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_server: String,
    /// 0 selects the default port for `connection_security`.
    pub smtp_port: u16,
    pub connection_security: ConnectionSecurity,
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("enable_sign_up_with_email", &self.enable_sign_up_with_email)
            .field("send_email_notifications", &self.send_email_notifications)
            .field("require_email_verification", &self.require_email_verification)
            .field("feedback_name", &self.feedback_name)
            .field("feedback_email", &self.feedback_email)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("connection_security", &self.connection_security)
            .finish()
    }
}

impl EmailSettings {
    /// Decode email settings received from a client.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming `email_settings` when the value
    /// does not have the expected shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationErrors> {
        serde_json::from_value(value).map_err(|e| {
            ValidationErrors::from(vec![FieldError::new("email_settings", e.to_string())])
        })
    }

    /// Port to connect to, resolving 0 to the security mode's default.
    #[must_use]
    pub const fn effective_port(&self) -> u16 {
        if self.smtp_port == 0 {
            self.connection_security.default_port()
        } else {
            self.smtp_port
        }
    }

    /// Replace a redacted password with the one in `stored`.
    pub fn restore_password_from(&mut self, stored: &Self) {
        if self.smtp_password == REDACTED_SETTING {
            self.smtp_password.clone_from(&stored.smtp_password);
        }
    }

    fn validate_into(&self, errors: &mut ValidationErrors) {
        if let Err(e) = Email::parse(&self.feedback_email) {
            errors.push("email_settings.feedback_email", e.to_string());
        }
        if self.send_email_notifications && self.smtp_server.trim().is_empty() {
            errors.push(
                "email_settings.smtp_server",
                "required when email notifications are enabled",
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    pub enable_console: bool,
    pub console_level: String,
    pub enable_file: bool,
    pub file_level: String,
    pub file_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub show_email_address: bool,
    pub show_full_name: bool,
}

/// The full site configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub service_settings: ServiceSettings,
    pub team_settings: TeamSettings,
    pub email_settings: EmailSettings,
    pub log_settings: LogSettings,
    pub privacy_settings: PrivacySettings,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            service_settings: ServiceSettings {
                site_url: String::new(),
                listen_address: ":8065".to_string(),
                enable_incoming_webhooks: false,
                enable_outgoing_webhooks: false,
                enable_commands: false,
                session_length_days: 30,
            },
            team_settings: TeamSettings {
                site_name: "Huddle".to_string(),
                max_users_per_team: 50,
                enable_team_creation: true,
                enable_user_creation: true,
                restrict_creation_to_domains: String::new(),
            },
            email_settings: EmailSettings {
                enable_sign_up_with_email: true,
                send_email_notifications: false,
                require_email_verification: false,
                feedback_name: "Huddle".to_string(),
                feedback_email: "feedback@huddle.local".to_string(),
                smtp_username: String::new(),
                smtp_password: String::new(),
                smtp_server: String::new(),
                smtp_port: 0,
                connection_security: ConnectionSecurity::default(),
            },
            log_settings: LogSettings {
                enable_console: true,
                console_level: "INFO".to_string(),
                enable_file: false,
                file_level: "INFO".to_string(),
                file_location: String::new(),
            },
            privacy_settings: PrivacySettings {
                show_email_address: true,
                show_full_name: true,
            },
        }
    }
}

impl SiteConfig {
    /// Decode a document received from a client.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming the document when it does not
    /// have the expected shape (missing section, wrong type, unknown key).
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationErrors> {
        serde_json::from_value(value)
            .map_err(|e| ValidationErrors::from(vec![FieldError::new("document", e.to_string())]))
    }

    /// Check every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let site_name = self.team_settings.site_name.trim();
        if site_name.is_empty() {
            errors.push("team_settings.site_name", "must not be empty");
        } else if site_name.chars().count() > MAX_SITE_NAME_LENGTH {
            errors.push(
                "team_settings.site_name",
                format!("must be at most {MAX_SITE_NAME_LENGTH} characters"),
            );
        }
        if self.team_settings.max_users_per_team == 0 {
            errors.push("team_settings.max_users_per_team", "must be greater than 0");
        }

        let site_url = &self.service_settings.site_url;
        if !site_url.is_empty()
            && !(site_url.starts_with("http://") || site_url.starts_with("https://"))
        {
            errors.push("service_settings.site_url", "must start with http:// or https://");
        }
        if self.service_settings.listen_address.trim().is_empty() {
            errors.push("service_settings.listen_address", "must not be empty");
        }
        if self.service_settings.session_length_days == 0 {
            errors.push("service_settings.session_length_days", "must be at least 1");
        }

        self.email_settings.validate_into(&mut errors);

        for (field, level) in [
            ("log_settings.console_level", &self.log_settings.console_level),
            ("log_settings.file_level", &self.log_settings.file_level),
        ] {
            if !LOG_LEVELS.contains(&level.as_str()) {
                errors.push(field, format!("must be one of {}", LOG_LEVELS.join(", ")));
            }
        }

        errors.into_result()
    }

    /// Fill defaulted fields so the stored document is complete.
    pub fn normalize(&mut self) {
        self.team_settings.site_name = self.team_settings.site_name.trim().to_string();
        if self.email_settings.feedback_name.trim().is_empty() {
            self.email_settings
                .feedback_name
                .clone_from(&self.team_settings.site_name);
        }
        self.email_settings.smtp_port = self.email_settings.effective_port();
    }

    /// Copy suitable for sending to clients, with secrets redacted.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut copy = self.clone();
        if !copy.email_settings.smtp_password.is_empty() {
            copy.email_settings.smtp_password = REDACTED_SETTING.to_string();
        }
        copy
    }

    /// Put back secrets a client received only in redacted form.
    pub fn restore_secrets_from(&mut self, stored: &Self) {
        self.email_settings
            .restore_password_from(&stored.email_settings);
    }

    /// Public, non-secret settings exposed to unauthenticated clients.
    #[must_use]
    pub fn client_properties(&self) -> BTreeMap<String, String> {
        let props = [
            ("SiteName", self.team_settings.site_name.clone()),
            ("SiteUrl", self.service_settings.site_url.clone()),
            (
                "EnableSignUpWithEmail",
                self.email_settings.enable_sign_up_with_email.to_string(),
            ),
            (
                "EnableTeamCreation",
                self.team_settings.enable_team_creation.to_string(),
            ),
            (
                "EnableUserCreation",
                self.team_settings.enable_user_creation.to_string(),
            ),
            (
                "RequireEmailVerification",
                self.email_settings.require_email_verification.to_string(),
            ),
            ("FeedbackEmail", self.email_settings.feedback_email.clone()),
            (
                "ShowEmailAddress",
                self.privacy_settings.show_email_address.to_string(),
            ),
            (
                "ShowFullName",
                self.privacy_settings.show_full_name.to_string(),
            ),
        ];
        props
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_failure() {
        let mut config = SiteConfig::default();
        config.team_settings.site_name = "   ".to_string();
        config.service_settings.site_url = "ftp://huddle".to_string();
        config.email_settings.feedback_email = "not-an-address".to_string();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains("team_settings.site_name"));
        assert!(errors.contains("service_settings.site_url"));
        assert!(errors.contains("email_settings.feedback_email"));
    }

    #[test]
    fn test_smtp_server_required_for_notifications() {
        let mut config = SiteConfig::default();
        config.email_settings.send_email_notifications = true;

        let errors = config.validate().unwrap_err();
        assert!(errors.contains("email_settings.smtp_server"));
    }

    #[test]
    fn test_site_name_length_limit() {
        let mut config = SiteConfig::default();
        config.team_settings.site_name = "x".repeat(31);
        assert!(config.validate().is_err());
        config.team_settings.site_name = "x".repeat(30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let mut config = SiteConfig::default();
        config.team_settings.site_name = " Acme ".to_string();
        config.email_settings.feedback_name = String::new();
        config.email_settings.connection_security = ConnectionSecurity::Tls;
        config.normalize();

        assert_eq!(config.team_settings.site_name, "Acme");
        assert_eq!(config.email_settings.feedback_name, "Acme");
        assert_eq!(config.email_settings.smtp_port, 465);
    }

    #[test]
    fn test_sanitize_and_restore_password() {
        let mut stored = SiteConfig::default();
        stored.email_settings.smtp_password = "hunter2".to_string();

        let mut sent = stored.sanitized();
        assert_eq!(sent.email_settings.smtp_password, REDACTED_SETTING);

        sent.restore_secrets_from(&stored);
        assert_eq!(sent.email_settings.smtp_password, "hunter2");
    }

    #[test]
    fn test_new_password_is_not_overwritten() {
        let mut stored = SiteConfig::default();
        stored.email_settings.smtp_password = "old".to_string();
        let mut incoming = SiteConfig::default();
        incoming.email_settings.smtp_password = "new".to_string();

        incoming.restore_secrets_from(&stored);
        assert_eq!(incoming.email_settings.smtp_password, "new");
    }

    #[test]
    fn test_from_value_rejects_missing_section() {
        let mut value = serde_json::to_value(SiteConfig::default()).unwrap();
        value.as_object_mut().unwrap().remove("team_settings");

        let errors = SiteConfig::from_value(value).unwrap_err();
        assert!(errors.contains("document"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut settings = SiteConfig::default().email_settings;
        settings.smtp_password = "hunter2".to_string();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_client_properties_omit_secrets() {
        let mut config = SiteConfig::default();
        config.email_settings.smtp_password = "hunter2".to_string();
        let props = config.client_properties();

        assert_eq!(props.get("SiteName").map(String::as_str), Some("Huddle"));
        assert!(props.values().all(|v| v != "hunter2"));
    }
}
