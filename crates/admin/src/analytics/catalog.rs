//! Metric catalog.
//!
//! Bundles and the order of their metrics are part of the public result
//! contract: clients read rows by position. Append new metrics to the end of
//! a bundle, never reorder.

use std::str::FromStr;

use thiserror::Error;

use crate::store::{CountTarget, DistinctTarget};

/// How a metric's value is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Count(CountTarget),
    Distinct(DistinctTarget),
    /// One count row per completed day.
    CountPerDay(CountTarget),
    /// One distinct-count row per completed day.
    DistinctPerDay(DistinctTarget),
}

impl Measure {
    #[must_use]
    pub const fn is_day_bucketed(self) -> bool {
        matches!(self, Self::CountPerDay(_) | Self::DistinctPerDay(_))
    }
}

/// Scopes a metric is defined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    AnyScope,
    /// Omitted (not zeroed) from team-scoped results.
    InstallationOnly,
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDef {
    pub name: &'static str,
    pub measure: Measure,
    pub availability: Availability,
}

const fn metric(name: &'static str, measure: Measure) -> MetricDef {
    MetricDef {
        name,
        measure,
        availability: Availability::AnyScope,
    }
}

static STANDARD: [MetricDef; 5] = [
    metric("channel_open_count", Measure::Count(CountTarget::OpenChannels)),
    metric("channel_private_count", Measure::Count(CountTarget::PrivateChannels)),
    metric("post_count", Measure::Count(CountTarget::Posts)),
    metric("unique_user_count", Measure::Distinct(DistinctTarget::Users)),
    MetricDef {
        name: "team_count",
        measure: Measure::Count(CountTarget::Teams),
        availability: Availability::InstallationOnly,
    },
];

static EXTRA_COUNTS: [MetricDef; 6] = [
    metric("file_post_count", Measure::Count(CountTarget::FilePosts)),
    metric("hashtag_post_count", Measure::Count(CountTarget::HashtagPosts)),
    metric("incoming_webhook_count", Measure::Count(CountTarget::IncomingWebhooks)),
    metric("outgoing_webhook_count", Measure::Count(CountTarget::OutgoingWebhooks)),
    metric("command_count", Measure::Count(CountTarget::SlashCommands)),
    metric("session_count", Measure::Count(CountTarget::ActiveSessions)),
];

static POST_COUNTS_DAY: [MetricDef; 1] = [metric(
    "post_count_for_day",
    Measure::CountPerDay(CountTarget::Posts),
)];

static USER_COUNTS_WITH_POSTS_DAY: [MetricDef; 1] = [metric(
    "active_user_count_for_day",
    Measure::DistinctPerDay(DistinctTarget::PostAuthors),
)];

/// A named, ordered set of metrics computed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bundle {
    Standard,
    ExtraCounts,
    PostCountsDay,
    UserCountsWithPostsDay,
}

/// The requested bundle name is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown analytics bundle: {0}")]
pub struct UnknownBundle(pub String);

impl Bundle {
    pub const ALL: [Self; 4] = [
        Self::Standard,
        Self::ExtraCounts,
        Self::PostCountsDay,
        Self::UserCountsWithPostsDay,
    ];

    /// Wire name of the bundle.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ExtraCounts => "extra_counts",
            Self::PostCountsDay => "post_counts_day",
            Self::UserCountsWithPostsDay => "user_counts_with_posts_day",
        }
    }

    /// Metrics of the bundle in output order.
    #[must_use]
    pub fn metrics(self) -> &'static [MetricDef] {
        match self {
            Self::Standard => &STANDARD,
            Self::ExtraCounts => &EXTRA_COUNTS,
            Self::PostCountsDay => &POST_COUNTS_DAY,
            Self::UserCountsWithPostsDay => &USER_COUNTS_WITH_POSTS_DAY,
        }
    }
}

impl FromStr for Bundle {
    type Err = UnknownBundle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bundle| bundle.name() == s)
            .ok_or_else(|| UnknownBundle(s.to_owned()))
    }
}

impl std::fmt::Display for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
