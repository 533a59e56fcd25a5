//! In-memory adapters for the collaborator traits.
//!
//! Used by the test suites and for running the admin API without a
//! database. State sits behind a `std::sync::Mutex`; every call holds the
//! lock only long enough to copy out its answer.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use huddle_core::{AuditRecord, ChannelId, Email, PostId, TeamId, UserId};

use crate::db::RepositoryError;
use crate::models::{EmailSettings, SiteConfig};
use crate::services::{DeliveryError, Mailer};
use crate::store::{
    AnalyticsStore, AuditStore, ConfigStore, CountFilter, CountTarget, DistinctTarget,
    StoreFuture,
};

/// Channel visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Open,
    Private,
}

/// Integration type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationKind {
    IncomingWebhook,
    OutgoingWebhook,
    SlashCommand,
}

/// A post to insert.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub channel: ChannelId,
    pub user: UserId,
    pub created_at: DateTime<Utc>,
    pub file_count: usize,
    pub hashtags: String,
}

impl NewPost {
    #[must_use]
    pub const fn new(channel: ChannelId, user: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            channel,
            user,
            created_at,
            file_count: 0,
            hashtags: String::new(),
        }
    }

    #[must_use]
    pub const fn with_files(mut self, count: usize) -> Self {
        self.file_count = count;
        self
    }

    #[must_use]
    pub fn with_hashtags(mut self, hashtags: impl Into<String>) -> Self {
        self.hashtags = hashtags.into();
        self
    }
}

#[derive(Debug)]
struct TeamRow {
    id: TeamId,
    created_at: DateTime<Utc>,
    deleted: bool,
}

#[derive(Debug)]
struct UserRow {
    id: UserId,
    active: bool,
}

#[derive(Debug)]
struct ChannelRow {
    id: ChannelId,
    team: TeamId,
    kind: ChannelKind,
    created_at: DateTime<Utc>,
    deleted: bool,
}

#[derive(Debug)]
struct PostRow {
    channel: ChannelId,
    team: Option<TeamId>,
    user: UserId,
    created_at: DateTime<Utc>,
    file_count: usize,
    hashtags: String,
}

#[derive(Debug)]
struct IntegrationRow {
    team: TeamId,
    kind: IntegrationKind,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
struct SessionRow {
    user: UserId,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    teams: Vec<TeamRow>,
    users: Vec<UserRow>,
    members: HashSet<(UserId, TeamId)>,
    channels: Vec<ChannelRow>,
    posts: Vec<PostRow>,
    integrations: Vec<IntegrationRow>,
    sessions: Vec<SessionRow>,
    audits: Vec<AuditRecord>,
}

impl State {
    fn is_member(&self, user: UserId, team: TeamId) -> bool {
        self.members.contains(&(user, team))
    }

    fn posts_matching<'a>(&'a self, filter: &'a CountFilter) -> impl Iterator<Item = &'a PostRow> {
        self.posts.iter().filter(move |post| {
            in_team(filter, post.team) && created_within(filter, post.created_at)
        })
    }

    fn count(&self, target: CountTarget, filter: &CountFilter) -> i64 {
        let n = match target {
            CountTarget::OpenChannels => self.count_channels(ChannelKind::Open, filter),
            CountTarget::PrivateChannels => self.count_channels(ChannelKind::Private, filter),
            CountTarget::Posts => self.posts_matching(filter).count(),
            CountTarget::FilePosts => self
                .posts_matching(filter)
                .filter(|post| post.file_count > 0)
                .count(),
            CountTarget::HashtagPosts => self
                .posts_matching(filter)
                .filter(|post| !post.hashtags.is_empty())
                .count(),
            CountTarget::IncomingWebhooks => {
                self.count_integrations(IntegrationKind::IncomingWebhook, filter)
            }
            CountTarget::OutgoingWebhooks => {
                self.count_integrations(IntegrationKind::OutgoingWebhook, filter)
            }
            CountTarget::SlashCommands => {
                self.count_integrations(IntegrationKind::SlashCommand, filter)
            }
            CountTarget::ActiveSessions => self
                .sessions
                .iter()
                .filter(|s| filter.as_of.is_none_or(|at| s.expires_at > at))
                .filter(|s| filter.team.is_none_or(|team| self.is_member(s.user, team)))
                .filter(|s| created_within(filter, s.created_at))
                .count(),
            CountTarget::Teams => self
                .teams
                .iter()
                .filter(|t| !t.deleted && in_team(filter, Some(t.id)))
                .filter(|t| created_within(filter, t.created_at))
                .count(),
        };
        to_i64(n)
    }

    fn count_channels(&self, kind: ChannelKind, filter: &CountFilter) -> usize {
        self.channels
            .iter()
            .filter(|c| !c.deleted && c.kind == kind && in_team(filter, Some(c.team)))
            .filter(|c| created_within(filter, c.created_at))
            .count()
    }

    fn count_integrations(&self, kind: IntegrationKind, filter: &CountFilter) -> usize {
        self.integrations
            .iter()
            .filter(|i| i.kind == kind && in_team(filter, Some(i.team)))
            .filter(|i| created_within(filter, i.created_at))
            .count()
    }

    fn count_distinct(&self, target: DistinctTarget, filter: &CountFilter) -> i64 {
        let n = match target {
            DistinctTarget::Users => self
                .users
                .iter()
                .filter(|u| u.active)
                .filter(|u| filter.team.is_none_or(|team| self.is_member(u.id, team)))
                .count(),
            DistinctTarget::PostAuthors => self
                .posts_matching(filter)
                .map(|post| post.user)
                .collect::<HashSet<_>>()
                .len(),
        };
        to_i64(n)
    }
}

fn in_team(filter: &CountFilter, team: Option<TeamId>) -> bool {
    filter.team.is_none_or(|wanted| team == Some(wanted))
}

fn created_within(filter: &CountFilter, at: DateTime<Utc>) -> bool {
    filter.created.is_none_or(|window| window.contains(at))
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// In-memory analytics and audit store.
///
/// Cloning shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    queries: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    /// Record a query and fail it if the store is set to fail.
    fn query<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, RepositoryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "memory store set to fail".to_string(),
            ));
        }
        Ok(self.with_state(|state| f(state)))
    }

    /// Number of store calls made so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Make every subsequent store call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn add_team(&self, name: &str) -> TeamId {
        let id = TeamId::new_v4();
        tracing::trace!(team_id = %id, name, "Memory team added");
        self.with_state(|s| {
            s.teams.push(TeamRow {
                id,
                created_at: Utc::now(),
                deleted: false,
            });
        });
        id
    }

    pub fn delete_team(&self, team: TeamId) {
        self.with_state(|s| {
            for row in s.teams.iter_mut().filter(|t| t.id == team) {
                row.deleted = true;
            }
        });
    }

    pub fn add_user(&self) -> UserId {
        let id = UserId::new_v4();
        self.with_state(|s| s.users.push(UserRow { id, active: true }));
        id
    }

    pub fn deactivate_user(&self, user: UserId) {
        self.with_state(|s| {
            for row in s.users.iter_mut().filter(|u| u.id == user) {
                row.active = false;
            }
        });
    }

    pub fn join_team(&self, user: UserId, team: TeamId) {
        self.with_state(|s| s.members.insert((user, team)));
    }

    pub fn add_channel(&self, team: TeamId, kind: ChannelKind) -> ChannelId {
        let id = ChannelId::new_v4();
        self.with_state(|s| {
            s.channels.push(ChannelRow {
                id,
                team,
                kind,
                created_at: Utc::now(),
                deleted: false,
            });
        });
        id
    }

    /// Delete a channel and the posts in it.
    pub fn delete_channel(&self, channel: ChannelId) {
        self.with_state(|s| {
            for row in s.channels.iter_mut().filter(|c| c.id == channel) {
                row.deleted = true;
            }
            s.posts.retain(|p| p.channel != channel);
        });
    }

    pub fn add_post(&self, post: NewPost) -> PostId {
        self.with_state(|s| {
            let team = s
                .channels
                .iter()
                .find(|c| c.id == post.channel)
                .map(|c| c.team);
            s.posts.push(PostRow {
                channel: post.channel,
                team,
                user: post.user,
                created_at: post.created_at,
                file_count: post.file_count,
                hashtags: post.hashtags,
            });
        });
        PostId::new_v4()
    }

    pub fn add_integration(&self, team: TeamId, kind: IntegrationKind) {
        self.with_state(|s| {
            s.integrations.push(IntegrationRow {
                team,
                kind,
                created_at: Utc::now(),
            });
        });
    }

    pub fn add_session(&self, user: UserId, expires_at: DateTime<Utc>) {
        self.with_state(|s| {
            s.sessions.push(SessionRow {
                user,
                created_at: Utc::now(),
                expires_at,
            });
        });
    }

    pub fn record_audit(&self, record: AuditRecord) {
        self.with_state(|s| s.audits.push(record));
    }
}

impl AnalyticsStore for MemoryStore {
    fn team_exists(&self, team: TeamId) -> StoreFuture<'_, bool> {
        let result = self.query(|s| s.teams.iter().any(|t| t.id == team && !t.deleted));
        Box::pin(async move { result })
    }

    fn count(&self, target: CountTarget, filter: CountFilter) -> StoreFuture<'_, i64> {
        let result = self.query(|s| s.count(target, &filter));
        Box::pin(async move { result })
    }

    fn count_distinct(&self, target: DistinctTarget, filter: CountFilter) -> StoreFuture<'_, i64> {
        let result = self.query(|s| s.count_distinct(target, &filter));
        Box::pin(async move { result })
    }
}

impl AuditStore for MemoryStore {
    fn list_audits(
        &self,
        team: Option<TeamId>,
        limit: usize,
    ) -> StoreFuture<'_, Vec<AuditRecord>> {
        let result = self.query(|s| {
            let mut records: Vec<AuditRecord> = s
                .audits
                .iter()
                .filter(|a| team.is_none_or(|team| a.team_id == Some(team)))
                .cloned()
                .collect();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            records.truncate(limit);
            records
        });
        Box::pin(async move { result })
    }
}

/// In-memory configuration store.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    config: Arc<Mutex<SiteConfig>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryConfigStore {
    #[must_use]
    pub fn new(config: SiteConfig) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            writes: Arc::default(),
        }
    }

    /// Copy of the stored document.
    #[must_use]
    pub fn current(&self) -> SiteConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of completed `store` calls.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> StoreFuture<'_, SiteConfig> {
        let config = self.current();
        Box::pin(async move { Ok(config) })
    }

    fn store(&self, config: SiteConfig) -> StoreFuture<'_, ()> {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

/// A test message handed to [`RecordingMailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: Email,
    pub smtp_server: String,
    pub smtp_password: String,
}

/// Mailer that records messages instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    reject: Option<String>,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mailer whose relay rejects every message with `reason`.
    #[must_use]
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            sent: Arc::default(),
            reject: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Mailer for RecordingMailer {
    fn send_test<'a>(
        &'a self,
        settings: &'a EmailSettings,
        to: &'a Email,
    ) -> BoxFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            if let Some(reason) = &self.reject {
                return Err(DeliveryError::Rejected(reason.clone()));
            }
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(SentMail {
                    to: to.clone(),
                    smtp_server: settings.smtp_server.clone(),
                    smtp_password: settings.smtp_password.clone(),
                });
            Ok(())
        })
    }
}
