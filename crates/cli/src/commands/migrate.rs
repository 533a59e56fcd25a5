//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! huddle-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `HUDDLE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Admin migrations live in `crates/admin/migrations/`. They create the
//! `huddle` schema, the tables analytics and audits read, and the session
//! table used by the admin API.

use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run admin database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url(|key| std::env::var(key).ok())?;

    tracing::info!("Connecting to admin database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running admin migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}

/// `HUDDLE_DATABASE_URL`, falling back to `DATABASE_URL` like the server.
fn database_url(lookup: impl Fn(&str) -> Option<String>) -> Result<String, MigrationError> {
    lookup("HUDDLE_DATABASE_URL")
        .or_else(|| lookup("DATABASE_URL"))
        .ok_or(MigrationError::MissingEnvVar("HUDDLE_DATABASE_URL"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_huddle_database_url_wins() {
        let url = database_url(lookup(&[
            ("HUDDLE_DATABASE_URL", "postgres://localhost/huddle"),
            ("DATABASE_URL", "postgres://fallback/huddle"),
        ]))
        .unwrap();
        assert_eq!(url, "postgres://localhost/huddle");
    }

    #[test]
    fn test_falls_back_to_database_url() {
        let url = database_url(lookup(&[("DATABASE_URL", "postgres://fallback/huddle")])).unwrap();
        assert_eq!(url, "postgres://fallback/huddle");
    }

    #[test]
    fn test_missing_url_names_primary_variable() {
        let err = database_url(lookup(&[])).unwrap_err();
        assert!(matches!(err, MigrationError::MissingEnvVar("HUDDLE_DATABASE_URL")));
    }
}
