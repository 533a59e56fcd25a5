//! Logs, configuration and mail test handlers.

use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::{
    error::AppError, logs::LogLine, middleware::RequirePrincipal, models::SiteConfig,
    state::AppState,
};

/// Recent server log lines, most recent first.
pub async fn logs(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
) -> Result<Json<Vec<LogLine>>, AppError> {
    Ok(Json(state.admin().logs(&principal)?))
}

/// Current site configuration with secrets redacted.
pub async fn get_config(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
) -> Result<Json<SiteConfig>, AppError> {
    Ok(Json(state.admin().config(&principal).await?))
}

/// Replace the site configuration; returns the stored document.
#[instrument(skip_all)]
pub async fn save_config(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Json(document): Json<serde_json::Value>,
) -> Result<Json<SiteConfig>, AppError> {
    Ok(Json(state.admin().save_config(&principal, document).await?))
}

/// Send a test message to the caller with the posted email settings.
#[instrument(skip_all)]
pub async fn test_email(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Json(settings): Json<serde_json::Value>,
) -> Result<StatusCode, AppError> {
    state.admin().test_email(&principal, settings).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public client properties. No authentication required.
pub async fn client_props(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    Ok(Json(state.admin().client_properties().await?))
}
