//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with
//! strict cookie settings (SameSite=Strict, 24hr inactivity expiry). The
//! session cookie is signed with a key derived from `HUDDLE_SESSION_SECRET`.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "huddle_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// The session layer could not be configured.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// The store rejected its schema or table name.
    #[error("invalid session store identifier: {0}")]
    Identifier(String),

    /// The signing key could not be built from the secret.
    #[error("invalid session signing key: {0}")]
    SigningKey(String),
}

/// Create the session layer with `PostgreSQL` store.
///
/// The `huddle.session` table is created by the admin migrations.
///
/// # Errors
///
/// Returns `SessionStoreError` if the schema or table name is rejected or
/// the signing key cannot be derived.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> Result<SessionManagerLayer<PostgresStore, SignedCookie>, SessionStoreError> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("huddle")
        .map_err(SessionStoreError::Identifier)?
        .with_table_name("session")
        .map_err(SessionStoreError::Identifier)?;

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");
    let key = signing_key(&config.session_secret)?;

    Ok(session_manager(store, key, is_secure))
}

/// Derive the 64-byte cookie signing key from the session secret.
///
/// # Errors
///
/// Returns `SessionStoreError::SigningKey` if the derived material is
/// rejected by the cookie crate.
pub fn signing_key(secret: &SecretString) -> Result<Key, SessionStoreError> {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::try_from(digest.as_slice()).map_err(|e| SessionStoreError::SigningKey(e.to_string()))
}

/// Wrap any session store with the admin cookie settings.
#[must_use]
pub fn session_manager<S: SessionStore>(
    store: S,
    key: Key,
    secure: bool,
) -> SessionManagerLayer<S, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_stable_per_secret() {
        let secret = SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let other = SecretString::from("Zq8#Lm2!Vt6@Rw1$Ks4^Hn9&Pb3*Xc7%");

        let key = signing_key(&secret).unwrap();
        assert_eq!(key.master(), signing_key(&secret).unwrap().master());
        assert_ne!(key.master(), signing_key(&other).unwrap().master());
    }
}
