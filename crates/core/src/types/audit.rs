//! Audit trail records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AuditId, SessionId, TeamId, UserId};

/// One entry of the append-only audit trail.
///
/// Written by the platform's audit subsystem; the admin layer only reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct AuditRecord {
    pub id: AuditId,
    pub created_at: DateTime<Utc>,
    /// Acting user.
    pub user_id: UserId,
    /// Team the action happened in, if any.
    pub team_id: Option<TeamId>,
    /// Action label, usually the request path.
    pub action: String,
    pub extra_info: String,
    pub ip_address: String,
    pub session_id: Option<SessionId>,
}
