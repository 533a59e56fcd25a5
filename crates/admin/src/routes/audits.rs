//! Audit trail route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use huddle_core::{AuditRecord, Capability};

use super::authorized_team_id;
use crate::{error::AppError, middleware::RequirePrincipal, state::AppState};

/// Query parameters for audit listings.
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    /// Maximum records to return (default 200, capped at 1000).
    pub limit: Option<usize>,
}

/// Installation-wide audit records, newest first.
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn all(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    let records = state.admin().all_audits(&principal, query.limit).await?;
    Ok(Json(records))
}

/// One team's audit records, newest first.
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn team(
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    Path(team_id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditRecord>>, AppError> {
    let team = authorized_team_id(&principal, Capability::ReadAudits, &team_id)?;
    let records = state
        .admin()
        .team_audits(&principal, team, query.limit)
        .await?;
    Ok(Json(records))
}
