//! Business logic services for admin.
//!
//! # Services
//!
//! - `admin` - Gated analytics, audit, log and configuration operations
//! - `email` - Test-message delivery via SMTP

pub mod admin;
pub mod email;

pub use admin::{AdminService, DEFAULT_AUDIT_LIMIT, MAX_AUDIT_LIMIT, audit_limit};
pub use email::{DeliveryError, Mailer, SmtpMailer};
