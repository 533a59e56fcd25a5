//! Authentication extractors for admin.
//!
//! The authentication layer stores the signed-in [`Principal`] in the
//! session. These extractors only read it; whether the principal may do
//! anything is decided by the authorization gate inside each operation.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use huddle_core::Principal;

use crate::error::{AppError, set_sentry_user};
use crate::models::keys;

/// Extractor that requires an authenticated principal.
///
/// Rejects with `401 Unauthorized` when the session carries none.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequirePrincipal(principal): RequirePrincipal) -> impl IntoResponse {
///     format!("Hello, {}!", principal.email)
/// }
/// ```
pub struct RequirePrincipal(pub Principal);

impl<S> FromRequestParts<S> for RequirePrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AppError::Unauthenticated)?;

        let principal: Principal = session
            .get(keys::CURRENT_PRINCIPAL)
            .await
            .ok()
            .flatten()
            .ok_or(AppError::Unauthenticated)?;

        set_sentry_user(&principal.id.to_string(), Some(principal.email.as_str()));

        Ok(Self(principal))
    }
}

/// Helper to set the current principal in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_principal(
    session: &Session,
    principal: &Principal,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CURRENT_PRINCIPAL, principal).await
}

/// Helper to clear the current principal from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_principal(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Principal>(keys::CURRENT_PRINCIPAL).await?;
    Ok(())
}
