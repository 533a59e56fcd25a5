//! HTTP middleware for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Session layer (tower-sessions)
//!
//! Handlers obtain the caller through the [`auth::RequirePrincipal`]
//! extractor.

pub mod auth;
pub mod session;

pub use auth::{RequirePrincipal, clear_current_principal, set_current_principal};
pub use session::{
    SESSION_COOKIE_NAME, SessionStoreError, create_session_layer, session_manager, signing_key,
};
