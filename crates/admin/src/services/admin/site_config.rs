//! Configuration read/write and the mail test.

use std::collections::BTreeMap;

use tracing::instrument;

use huddle_core::{Capability, Principal};

use super::AdminService;
use crate::authz::authorize;
use crate::error::AdminError;
use crate::models::{EmailSettings, FieldError, SiteConfig, ValidationErrors};

/// Build number baked in at compile time, if the build provided one.
const BUILD_NUMBER: Option<&str> = option_env!("HUDDLE_BUILD_NUMBER");

impl AdminService {
    /// Current configuration with secrets redacted.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` for non-admins and
    /// `AdminError::Store` if the document cannot be loaded.
    #[instrument(skip_all, fields(user_id = %principal.id))]
    pub async fn config(&self, principal: &Principal) -> Result<SiteConfig, AdminError> {
        authorize(principal, Capability::ReadConfig)?;
        let config = self.config.load().await?;
        Ok(config.sanitized())
    }

    /// Validate and replace the whole configuration document.
    ///
    /// Redacted secrets are taken from the stored document. Returns the
    /// document as persisted, redacted again.
    ///
    /// # Errors
    ///
    /// - `AdminError::Unauthorized` for non-admins.
    /// - `AdminError::InvalidDocument` listing every failing field; nothing
    ///   is written.
    /// - `AdminError::Store` if loading or persisting fails.
    #[instrument(skip_all, fields(user_id = %principal.id))]
    pub async fn save_config(
        &self,
        principal: &Principal,
        document: serde_json::Value,
    ) -> Result<SiteConfig, AdminError> {
        authorize(principal, Capability::WriteConfig)?;

        let mut config = SiteConfig::from_value(document)?;
        config.validate()?;

        let stored = self.config.load().await?;
        config.restore_secrets_from(&stored);
        config.normalize();

        self.config.store(config.clone()).await?;
        tracing::info!(
            site_name = %config.team_settings.site_name,
            "Site configuration saved"
        );

        Ok(config.sanitized())
    }

    /// Send a test message to the caller using the email settings in
    /// `document`.
    ///
    /// The settings are not persisted. A redacted password is replaced by
    /// the stored one.
    ///
    /// # Errors
    ///
    /// - `AdminError::Unauthorized` for non-admins.
    /// - `AdminError::InvalidDocument` if the settings are malformed or name
    ///   no SMTP server.
    /// - `AdminError::Delivery` if the relay cannot deliver the message.
    #[instrument(skip_all, fields(user_id = %principal.id))]
    pub async fn test_email(
        &self,
        principal: &Principal,
        document: serde_json::Value,
    ) -> Result<(), AdminError> {
        authorize(principal, Capability::SendTestEmail)?;

        let mut settings = EmailSettings::from_value(document)?;

        if settings.smtp_server.trim().is_empty() {
            return Err(ValidationErrors::from(vec![FieldError::new(
                "email_settings.smtp_server",
                "required to send a test email",
            )])
            .into());
        }

        let stored = self.config.load().await?;
        settings.restore_password_from(&stored.email_settings);

        self.mailer.send_test(&settings, &principal.email).await?;
        Ok(())
    }

    /// Public client properties. Open to any caller.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Store` if the document cannot be loaded.
    pub async fn client_properties(&self) -> Result<BTreeMap<String, String>, AdminError> {
        let config = self.config.load().await?;
        let mut props = config.client_properties();
        props.insert("Version".to_string(), env!("CARGO_PKG_VERSION").to_string());
        props.insert(
            "BuildNumber".to_string(),
            BUILD_NUMBER.unwrap_or("dev").to_string(),
        );
        Ok(props)
    }
}
