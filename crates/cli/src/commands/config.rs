//! Site configuration commands.
//!
//! Both commands read the same JSON document the admin server serves, so an
//! operator can vet a hand-edited file before the server picks it up.

use std::path::PathBuf;

use thiserror::Error;

use huddle_admin::db::{FileConfigStore, RepositoryError};
use huddle_admin::models::ValidationErrors;

/// Errors that can occur while inspecting the document.
#[derive(Debug, Error)]
pub enum ConfigCommandError {
    #[error("Could not read site config: {0}")]
    Read(#[from] RepositoryError),

    #[error("Site config is invalid: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Could not render site config: {0}")]
    Render(#[from] serde_json::Error),
}

fn resolve_path(path: Option<PathBuf>) -> PathBuf {
    path.or_else(|| {
        dotenvy::dotenv().ok();
        std::env::var_os("HUDDLE_SITE_CONFIG_PATH").map(PathBuf::from)
    })
    .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Validate the document, reporting every failing field.
///
/// # Errors
///
/// Returns `ConfigCommandError::Invalid` listing the failing fields, or
/// `ConfigCommandError::Read` if the file cannot be parsed.
pub async fn check(path: Option<PathBuf>) -> Result<(), ConfigCommandError> {
    let store = FileConfigStore::new(resolve_path(path));
    let config = store.read().await?;

    if let Err(errors) = config.validate() {
        for error in errors.iter() {
            tracing::error!(field = %error.field, "{}", error.message);
        }
        return Err(errors.into());
    }

    tracing::info!(path = %store.path().display(), "Site config is valid");
    Ok(())
}

/// Print the document with secrets redacted.
///
/// # Errors
///
/// Returns `ConfigCommandError::Read` if the file cannot be parsed.
pub async fn show(path: Option<PathBuf>) -> Result<(), ConfigCommandError> {
    let store = FileConfigStore::new(resolve_path(path));
    let config = store.read().await?.sanitized();
    let rendered = serde_json::to_string_pretty(&config)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
    }
    Ok(())
}
