//! Collaborator contracts the admin layer depends on.
//!
//! Each trait is object safe so handlers can hold `Arc<dyn ...>` and tests can
//! swap in the [`crate::memory`] adapters. Futures are boxed with
//! [`futures::future::BoxFuture`].

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use huddle_core::{AuditRecord, TeamId};

use crate::db::RepositoryError;
use crate::models::SiteConfig;

/// Future returned by every store call.
pub type StoreFuture<'a, T> = BoxFuture<'a, Result<T, RepositoryError>>;

/// Entity set counted by a plain count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountTarget {
    OpenChannels,
    PrivateChannels,
    Posts,
    /// Posts with at least one attached file.
    FilePosts,
    /// Posts with a non-empty hashtag set.
    HashtagPosts,
    IncomingWebhooks,
    OutgoingWebhooks,
    SlashCommands,
    /// Sessions that have not expired at [`CountFilter::as_of`].
    ActiveSessions,
    Teams,
}

/// Entity set counted by distinct identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistinctTarget {
    /// Distinct active user accounts (team members when team-scoped).
    Users,
    /// Distinct authors of matching posts.
    PostAuthors,
}

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `at` falls inside the window.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Restrictions applied to a count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountFilter {
    /// Restrict to one team's partition; `None` counts the installation.
    pub team: Option<TeamId>,
    /// Restrict to entities created inside the window.
    pub created: Option<TimeWindow>,
    /// Instant used for liveness checks such as session expiry.
    pub as_of: Option<DateTime<Utc>>,
}

impl CountFilter {
    /// Copy of this filter restricted to `window`.
    #[must_use]
    pub const fn within(self, window: TimeWindow) -> Self {
        Self {
            created: Some(window),
            ..self
        }
    }
}

/// Read access to the entity counts analytics are computed from.
pub trait AnalyticsStore: Send + Sync {
    /// Whether a live team with this ID exists.
    fn team_exists(&self, team: TeamId) -> StoreFuture<'_, bool>;

    /// Number of entities in `target` matching `filter`.
    fn count(&self, target: CountTarget, filter: CountFilter) -> StoreFuture<'_, i64>;

    /// Number of distinct identities in `target` matching `filter`.
    fn count_distinct(&self, target: DistinctTarget, filter: CountFilter) -> StoreFuture<'_, i64>;
}

/// Read access to the audit trail.
pub trait AuditStore: Send + Sync {
    /// Up to `limit` records, newest first, optionally for one team.
    fn list_audits(&self, team: Option<TeamId>, limit: usize)
    -> StoreFuture<'_, Vec<AuditRecord>>;
}

/// Load and replace the site configuration document.
///
/// Implementations must serialize concurrent `store` calls; the last writer
/// wins.
pub trait ConfigStore: Send + Sync {
    fn load(&self) -> StoreFuture<'_, SiteConfig>;

    fn store(&self, config: SiteConfig) -> StoreFuture<'_, ()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_window_is_half_open() {
        let start = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 5, 2, 0, 0, 0).unwrap();
        let window = TimeWindow::new(start, end);

        assert!(window.contains(start));
        assert!(!window.contains(end));
        assert!(!window.contains(start - chrono::TimeDelta::seconds(1)));
    }
}
