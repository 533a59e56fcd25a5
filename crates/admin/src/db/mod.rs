//! Persistence adapters for the admin layer.
//!
//! # Database: `huddle` schema
//!
//! ## Tables read here
//!
//! - `teams`, `users`, `team_members` - Tenants and their members
//! - `channels`, `posts` - Message data counted by analytics
//! - `incoming_webhooks`, `outgoing_webhooks`, `commands` - Integrations
//! - `sessions` - Login sessions (`session_count`)
//! - `audits` - Append-only audit trail
//! - `session` - tower-sessions storage for the admin API
//!
//! The site configuration document lives in a JSON file, see [`config_file`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p huddle-cli -- migrate
//! ```

pub mod analytics;
pub mod audits;
pub mod config_file;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use analytics::PgAnalyticsStore;
pub use audits::PgAuditStore;
pub use config_file::FileConfigStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading or writing a backing file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store is not reachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
