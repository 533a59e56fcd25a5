//! Analytics engine.
//!
//! Resolves a bundle name and scope into a [`scope::MetricPlan`], evaluates
//! every planned metric against an [`AnalyticsStore`], and returns the rows
//! in catalog order.

pub mod catalog;
pub mod day_buckets;
pub mod scope;

use futures::future::try_join_all;
use tracing::instrument;

use huddle_core::{AnalyticsRows, Capability, MetricRow, Principal};

use crate::authz::authorize;
use crate::db::RepositoryError;
use crate::error::AdminError;
use crate::store::{AnalyticsStore, CountFilter};

pub use catalog::{Bundle, Measure, MetricDef, UnknownBundle};
pub use day_buckets::{
    Clock, DayBucket, FixedClock, ReferenceZone, SystemClock, completed_days,
};
pub use scope::{MetricPlan, Scope, resolve};

/// Completed days returned by day-bucketed bundles.
pub const DEFAULT_DAY_WINDOW: u32 = 30;

/// Computes analytics bundles against a store.
pub struct AnalyticsEngine<'a> {
    store: &'a dyn AnalyticsStore,
    clock: &'a dyn Clock,
    day_window: u32,
}

impl<'a> AnalyticsEngine<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn AnalyticsStore, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            day_window: DEFAULT_DAY_WINDOW,
        }
    }

    /// Override the number of completed days per day-bucketed metric.
    #[must_use]
    pub const fn with_day_window(self, days: u32) -> Self {
        Self {
            day_window: days,
            ..self
        }
    }

    /// Compute `bundle_name` for `scope` on behalf of `principal`.
    ///
    /// Metrics run concurrently; rows come back in catalog order, and a
    /// day-bucketed metric expands to one row per completed day, most recent
    /// first. Any store failure fails the whole request.
    ///
    /// # Errors
    ///
    /// - [`AdminError::Unauthorized`] if the principal may not read analytics.
    /// - [`AdminError::InvalidScope`] for an unknown bundle or team.
    /// - [`AdminError::Store`] if any count fails.
    #[instrument(skip(self, principal), fields(user_id = %principal.id))]
    pub async fn compute(
        &self,
        principal: &Principal,
        scope: Scope,
        bundle_name: &str,
    ) -> Result<AnalyticsRows, AdminError> {
        authorize(principal, Capability::ReadAnalytics)?;

        let bundle: Bundle = bundle_name
            .parse()
            .map_err(|e: UnknownBundle| AdminError::InvalidScope(e.to_string()))?;

        if let Scope::Team(team) = scope {
            if !self.store.team_exists(team).await? {
                return Err(AdminError::InvalidScope(format!("unknown team: {team}")));
            }
        }

        let plan = resolve(bundle, scope);
        let now = self.clock.now();
        let days = if plan.iter().any(|p| p.def.measure.is_day_bucketed()) {
            completed_days(now, self.clock.zone(), self.day_window)
        } else {
            Vec::new()
        };

        let base = CountFilter {
            team: scope.team(),
            created: None,
            as_of: Some(now),
        };

        let evaluated = try_join_all(
            plan.iter()
                .map(|planned| self.evaluate(planned.def, base, &days)),
        )
        .await?;

        let rows: Vec<MetricRow> = evaluated.into_iter().flatten().collect();
        tracing::debug!(bundle = %bundle, rows = rows.len(), "Analytics computed");

        Ok(AnalyticsRows::new(rows))
    }

    async fn evaluate(
        &self,
        def: &'static MetricDef,
        filter: CountFilter,
        days: &[DayBucket],
    ) -> Result<Vec<MetricRow>, RepositoryError> {
        match def.measure {
            Measure::Count(target) => {
                let value = self.store.count(target, filter).await?;
                Ok(vec![MetricRow::new(def.name, value)])
            }
            Measure::Distinct(target) => {
                let value = self.store.count_distinct(target, filter).await?;
                Ok(vec![MetricRow::new(def.name, value)])
            }
            Measure::CountPerDay(target) => {
                try_join_all(days.iter().map(|day| async move {
                    let value = self.store.count(target, filter.within(day.window)).await?;
                    Ok::<_, RepositoryError>(MetricRow::for_day(def.name, day.date, value))
                }))
                .await
            }
            Measure::DistinctPerDay(target) => {
                try_join_all(days.iter().map(|day| async move {
                    let value = self
                        .store
                        .count_distinct(target, filter.within(day.window))
                        .await?;
                    Ok::<_, RepositoryError>(MetricRow::for_day(def.name, day.date, value))
                }))
                .await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use huddle_core::{Email, Role, TeamId, UserId};

    use super::*;
    use crate::memory::{ChannelKind, MemoryStore, NewPost};

    fn principal(role: Role) -> Principal {
        Principal {
            id: UserId::new_v4(),
            email: Email::parse("admin@huddle.example").unwrap(),
            role,
        }
    }

    fn clock() -> FixedClock {
        FixedClock::utc(Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap())
    }

    /// One team, two members, one public channel, one post made yesterday.
    fn seeded() -> (MemoryStore, TeamId) {
        let store = MemoryStore::new();
        let team = store.add_team("core");
        let author = store.add_user();
        let other = store.add_user();
        store.join_team(author, team);
        store.join_team(other, team);
        let channel = store.add_channel(team, ChannelKind::Open);
        let yesterday = Utc.with_ymd_and_hms(2026, 6, 14, 9, 0, 0).unwrap();
        store.add_post(NewPost::new(channel, author, yesterday));
        (store, team)
    }

    #[tokio::test]
    async fn test_member_is_rejected_before_any_query() {
        let (store, team) = seeded();
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let err = engine
            .compute(&principal(Role::Member), Scope::Team(team), "standard")
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Unauthorized));
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_standard_team_scope() {
        let (store, team) = seeded();
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let rows = engine
            .compute(&principal(Role::SystemAdmin), Scope::Team(team), "standard")
            .await
            .unwrap();

        assert_eq!(
            rows.names(),
            [
                "channel_open_count",
                "channel_private_count",
                "post_count",
                "unique_user_count"
            ]
        );
        assert_eq!(rows.row(0).unwrap().value, 1);
        assert_eq!(rows.row(1).unwrap().value, 0);
        assert_eq!(rows.row(2).unwrap().value, 1);
        assert_eq!(rows.row(3).unwrap().value, 2);
    }

    #[tokio::test]
    async fn test_standard_installation_scope_appends_team_count() {
        let (store, _) = seeded();
        store.add_team("other");
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let rows = engine
            .compute(&principal(Role::SystemAdmin), Scope::Installation, "standard")
            .await
            .unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows.value_of("team_count"), Some(2));
    }

    #[tokio::test]
    async fn test_unknown_bundle_is_invalid_scope() {
        let (store, _) = seeded();
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let err = engine
            .compute(&principal(Role::SystemAdmin), Scope::Installation, "everything")
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::InvalidScope(_)));
    }

    #[tokio::test]
    async fn test_unknown_team_is_invalid_scope() {
        let (store, _) = seeded();
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let err = engine
            .compute(
                &principal(Role::SystemAdmin),
                Scope::Team(TeamId::new_v4()),
                "standard",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::InvalidScope(_)));
    }

    #[tokio::test]
    async fn test_post_counts_day_first_row_is_yesterday() {
        let (store, team) = seeded();
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let rows = engine
            .compute(
                &principal(Role::SystemAdmin),
                Scope::Team(team),
                "post_counts_day",
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), DEFAULT_DAY_WINDOW as usize);
        let first = rows.row(0).unwrap();
        assert_eq!(first.value, 1);
        assert_eq!(first.date.unwrap().to_string(), "2026-06-14");
        assert!(rows.iter().skip(1).all(|row| row.value == 0));
    }

    #[tokio::test]
    async fn test_todays_posts_fall_in_no_bucket() {
        let (store, team) = seeded();
        let channel = store.add_channel(team, ChannelKind::Open);
        let author = store.add_user();
        let this_morning = Utc.with_ymd_and_hms(2026, 6, 15, 8, 0, 0).unwrap();
        store.add_post(NewPost::new(channel, author, this_morning));
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let rows = engine
            .compute(
                &principal(Role::SystemAdmin),
                Scope::Installation,
                "post_counts_day",
            )
            .await
            .unwrap();

        assert_eq!(rows.iter().map(|r| r.value).sum::<i64>(), 1);
    }

    #[tokio::test]
    async fn test_user_counts_with_posts_day_counts_distinct_authors() {
        let (store, team) = seeded();
        let channel = store.add_channel(team, ChannelKind::Private);
        let author = store.add_user();
        store.join_team(author, team);
        let two_days_ago = Utc.with_ymd_and_hms(2026, 6, 13, 10, 0, 0).unwrap();
        store.add_post(NewPost::new(channel, author, two_days_ago));
        store.add_post(NewPost::new(
            channel,
            author,
            two_days_ago + TimeDelta::hours(1),
        ));
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock).with_day_window(3);

        let rows = engine
            .compute(
                &principal(Role::SystemAdmin),
                Scope::Team(team),
                "user_counts_with_posts_day",
            )
            .await
            .unwrap();

        let values: Vec<_> = rows.iter().map(|r| r.value).collect();
        assert_eq!(values, [1, 1, 0]);
        assert!(rows.iter().all(|r| r.name == "active_user_count_for_day"));
    }

    #[tokio::test]
    async fn test_store_failure_fails_whole_request() {
        let (store, team) = seeded();
        store.set_failing(true);
        let clock = clock();
        let engine = AnalyticsEngine::new(&store, &clock);

        let err = engine
            .compute(&principal(Role::SystemAdmin), Scope::Team(team), "standard")
            .await
            .unwrap_err();

        assert!(matches!(err, AdminError::Store(_)));
    }
}
