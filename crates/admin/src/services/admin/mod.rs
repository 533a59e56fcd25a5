//! Administrative operations.
//!
//! [`AdminService`] is the single entry point the HTTP layer calls. Every
//! method authorizes the principal before it touches a collaborator, so a
//! denied caller never reaches a store, the mailer, or the log ring.

mod site_config;

use std::sync::Arc;

use tracing::instrument;

use huddle_core::{AnalyticsRows, AuditRecord, Capability, Principal, TeamId};

use crate::analytics::{AnalyticsEngine, Clock, DEFAULT_DAY_WINDOW, Scope, SystemClock};
use crate::authz::authorize;
use crate::error::AdminError;
use crate::logs::{LogBuffer, LogLine};
use crate::services::Mailer;
use crate::store::{AnalyticsStore, AuditStore, ConfigStore};

/// Audit records returned when the caller gives no limit.
pub const DEFAULT_AUDIT_LIMIT: usize = 200;
/// Upper bound on audit records per request.
pub const MAX_AUDIT_LIMIT: usize = 1000;

/// Clamp a requested audit limit to `1..=MAX_AUDIT_LIMIT`.
#[must_use]
pub fn audit_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT)
}

/// Admin operations over shared collaborators.
#[derive(Clone)]
pub struct AdminService {
    analytics: Arc<dyn AnalyticsStore>,
    audits: Arc<dyn AuditStore>,
    config: Arc<dyn ConfigStore>,
    mailer: Arc<dyn Mailer>,
    logs: LogBuffer,
    clock: Arc<dyn Clock>,
    day_window: u32,
}

impl AdminService {
    /// Create a service using the system clock and default day window.
    #[must_use]
    pub fn new(
        analytics: Arc<dyn AnalyticsStore>,
        audits: Arc<dyn AuditStore>,
        config: Arc<dyn ConfigStore>,
        mailer: Arc<dyn Mailer>,
        logs: LogBuffer,
    ) -> Self {
        Self {
            analytics,
            audits,
            config,
            mailer,
            logs,
            clock: Arc::new(SystemClock::default()),
            day_window: DEFAULT_DAY_WINDOW,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn with_day_window(mut self, days: u32) -> Self {
        self.day_window = days;
        self
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Compute an analytics bundle.
    ///
    /// # Errors
    ///
    /// See [`AnalyticsEngine::compute`].
    pub async fn analytics(
        &self,
        principal: &Principal,
        scope: Scope,
        bundle: &str,
    ) -> Result<AnalyticsRows, AdminError> {
        AnalyticsEngine::new(self.analytics.as_ref(), self.clock.as_ref())
            .with_day_window(self.day_window)
            .compute(principal, scope, bundle)
            .await
    }

    // =========================================================================
    // Audits & Logs
    // =========================================================================

    /// Audit records of one team, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` for non-admins and
    /// `AdminError::Store` if the audit store fails.
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn team_audits(
        &self,
        principal: &Principal,
        team: TeamId,
        limit: Option<usize>,
    ) -> Result<Vec<AuditRecord>, AdminError> {
        authorize(principal, Capability::ReadAudits)?;
        let records = self
            .audits
            .list_audits(Some(team), audit_limit(limit))
            .await?;
        Ok(records)
    }

    /// Installation-wide audit records, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` for non-admins and
    /// `AdminError::Store` if the audit store fails.
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn all_audits(
        &self,
        principal: &Principal,
        limit: Option<usize>,
    ) -> Result<Vec<AuditRecord>, AdminError> {
        authorize(principal, Capability::ReadAudits)?;
        let records = self.audits.list_audits(None, audit_limit(limit)).await?;
        Ok(records)
    }

    /// Recent server log lines, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` for non-admins.
    pub fn logs(&self, principal: &Principal) -> Result<Vec<LogLine>, AdminError> {
        let grant = authorize(principal, Capability::ReadLogs)?;
        Ok(self.logs.snapshot(&grant))
    }
}
