//! Audit trail repository.

use sqlx::PgPool;

use huddle_core::{AuditRecord, TeamId};

use crate::store::{AuditStore, StoreFuture};

/// Audit store backed by `huddle.audits`.
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    /// Create a new audit store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditStore for PgAuditStore {
    fn list_audits(
        &self,
        team: Option<TeamId>,
        limit: usize,
    ) -> StoreFuture<'_, Vec<AuditRecord>> {
        Box::pin(async move {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let records = sqlx::query_as::<_, AuditRecord>(
                r"
                SELECT id, created_at, user_id, team_id, action, extra_info,
                       ip_address, session_id
                FROM huddle.audits
                WHERE $1::uuid IS NULL OR team_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
                ",
            )
            .bind(team)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

            Ok(records)
        })
    }
}
