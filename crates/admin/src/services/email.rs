//! Test-message delivery over SMTP.
//!
//! Settings come from the request, not the stored document, so each send
//! builds its own transport.

use std::time::Duration;

use futures::future::BoxFuture;
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{AsyncSmtpTransportBuilder, Error as SmtpError, authentication::Credentials},
};
use thiserror::Error;

use huddle_core::Email;

use crate::models::{ConnectionSecurity, EmailSettings};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const TEST_SUBJECT: &str = "Huddle SMTP test";
const TEST_BODY: &str = "This is a test message from your Huddle server. \
If you received it, your email settings work.";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The relay refused the message.
    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Sends the connectivity test message.
pub trait Mailer: Send + Sync {
    /// Deliver a test message to `to` using `settings`.
    fn send_test<'a>(
        &'a self,
        settings: &'a EmailSettings,
        to: &'a Email,
    ) -> BoxFuture<'a, Result<(), DeliveryError>>;
}

/// [`Mailer`] backed by a lettre SMTP transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn transport(
        settings: &EmailSettings,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let host = settings.smtp_server.as_str();
        let builder: AsyncSmtpTransportBuilder = match settings.connection_security {
            ConnectionSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)?,
            ConnectionSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            }
            ConnectionSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let mut builder = builder
            .port(settings.effective_port())
            .timeout(Some(SEND_TIMEOUT));
        if !settings.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.smtp_username.clone(),
                settings.smtp_password.clone(),
            ));
        }

        Ok(builder.build())
    }

    fn message(settings: &EmailSettings, to: &Email) -> Result<Message, DeliveryError> {
        let from_address: Address = settings
            .feedback_email
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(settings.feedback_email.clone()))?;
        let to_address: Address = to
            .as_str()
            .parse()
            .map_err(|_| DeliveryError::InvalidAddress(to.to_string()))?;

        let message = Message::builder()
            .from(Mailbox::new(
                Some(settings.feedback_name.clone()),
                from_address,
            ))
            .to(Mailbox::new(None, to_address))
            .subject(TEST_SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(TEST_BODY.to_string())?;

        Ok(message)
    }
}

impl Mailer for SmtpMailer {
    fn send_test<'a>(
        &'a self,
        settings: &'a EmailSettings,
        to: &'a Email,
    ) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            let message = Self::message(settings, to)?;
            let transport = Self::transport(settings)?;

            let response = transport.send(message).await?;
            if !response.is_positive() {
                return Err(DeliveryError::Rejected(response.code().to_string()));
            }

            tracing::info!(
                to = %to,
                smtp_server = %settings.smtp_server,
                "Test email sent successfully"
            );
            Ok(())
        })
    }
}
