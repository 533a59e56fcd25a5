//! Analytics route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use huddle_core::{AnalyticsRows, Capability};

use super::authorized_team_id;
use crate::{
    analytics::Scope, error::AppError, middleware::RequirePrincipal, state::AppState,
};

/// Installation-wide analytics bundle.
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn installation(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(bundle): Path<String>,
) -> Result<Json<AnalyticsRows>, AppError> {
    let rows = state
        .admin()
        .analytics(&principal, Scope::Installation, &bundle)
        .await?;
    Ok(Json(rows))
}

/// Analytics bundle for one team.
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn team(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path((team_id, bundle)): Path<(String, String)>,
) -> Result<Json<AnalyticsRows>, AppError> {
    let team = authorized_team_id(&principal, Capability::ReadAnalytics, &team_id)?;
    let rows = state
        .admin()
        .analytics(&principal, Scope::Team(team), &bundle)
        .await?;
    Ok(Json(rows))
}
