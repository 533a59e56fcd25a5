//! `PostgreSQL` analytics store.
//!
//! Each count target maps to one `SELECT COUNT(..)` over the `huddle`
//! schema. Team, creation-window and liveness restrictions are appended
//! with bound parameters.

use sqlx::{PgPool, Postgres, QueryBuilder};

use huddle_core::TeamId;

use crate::store::{AnalyticsStore, CountFilter, CountTarget, DistinctTarget, StoreFuture};

/// How a source is tied to a team.
#[derive(Debug, Clone, Copy)]
enum TeamLink {
    /// The row carries the team ID in this column.
    Column(&'static str),
    /// The row belongs to the user in this column; the user must be a member.
    Member(&'static str),
}

/// A countable row source.
#[derive(Debug, Clone, Copy)]
struct Source {
    /// `SELECT .. FROM .. WHERE <base conditions>`
    select: &'static str,
    team: TeamLink,
    created_at: &'static str,
    /// Expiry column compared against the anchor instant.
    expires_at: Option<&'static str>,
}

const fn count_source(target: CountTarget) -> Source {
    match target {
        CountTarget::OpenChannels => channels(
            "SELECT COUNT(*) FROM huddle.channels c \
             WHERE c.deleted_at IS NULL AND c.kind = 'open'",
        ),
        CountTarget::PrivateChannels => channels(
            "SELECT COUNT(*) FROM huddle.channels c \
             WHERE c.deleted_at IS NULL AND c.kind = 'private'",
        ),
        CountTarget::Posts => posts(
            "SELECT COUNT(*) FROM huddle.posts p \
             JOIN huddle.channels c ON c.id = p.channel_id \
             WHERE p.deleted_at IS NULL AND c.deleted_at IS NULL",
        ),
        CountTarget::FilePosts => posts(
            "SELECT COUNT(*) FROM huddle.posts p \
             JOIN huddle.channels c ON c.id = p.channel_id \
             WHERE p.deleted_at IS NULL AND c.deleted_at IS NULL \
             AND cardinality(p.file_ids) > 0",
        ),
        CountTarget::HashtagPosts => posts(
            "SELECT COUNT(*) FROM huddle.posts p \
             JOIN huddle.channels c ON c.id = p.channel_id \
             WHERE p.deleted_at IS NULL AND c.deleted_at IS NULL \
             AND p.hashtags <> ''",
        ),
        CountTarget::IncomingWebhooks => integration(
            "SELECT COUNT(*) FROM huddle.incoming_webhooks i WHERE i.deleted_at IS NULL",
        ),
        CountTarget::OutgoingWebhooks => integration(
            "SELECT COUNT(*) FROM huddle.outgoing_webhooks i WHERE i.deleted_at IS NULL",
        ),
        CountTarget::SlashCommands => {
            integration("SELECT COUNT(*) FROM huddle.commands i WHERE i.deleted_at IS NULL")
        }
        CountTarget::ActiveSessions => Source {
            select: "SELECT COUNT(*) FROM huddle.sessions s WHERE TRUE",
            team: TeamLink::Member("s.user_id"),
            created_at: "s.created_at",
            expires_at: Some("s.expires_at"),
        },
        CountTarget::Teams => Source {
            select: "SELECT COUNT(*) FROM huddle.teams t WHERE t.deleted_at IS NULL",
            team: TeamLink::Column("t.id"),
            created_at: "t.created_at",
            expires_at: None,
        },
    }
}

const fn distinct_source(target: DistinctTarget) -> Source {
    match target {
        DistinctTarget::Users => Source {
            select: "SELECT COUNT(DISTINCT u.id) FROM huddle.users u WHERE u.deleted_at IS NULL",
            team: TeamLink::Member("u.id"),
            created_at: "u.created_at",
            expires_at: None,
        },
        DistinctTarget::PostAuthors => posts(
            "SELECT COUNT(DISTINCT p.user_id) FROM huddle.posts p \
             JOIN huddle.channels c ON c.id = p.channel_id \
             WHERE p.deleted_at IS NULL AND c.deleted_at IS NULL",
        ),
    }
}

const fn channels(select: &'static str) -> Source {
    Source {
        select,
        team: TeamLink::Column("c.team_id"),
        created_at: "c.created_at",
        expires_at: None,
    }
}

const fn posts(select: &'static str) -> Source {
    Source {
        select,
        team: TeamLink::Column("c.team_id"),
        created_at: "p.created_at",
        expires_at: None,
    }
}

const fn integration(select: &'static str) -> Source {
    Source {
        select,
        team: TeamLink::Column("i.team_id"),
        created_at: "i.created_at",
        expires_at: None,
    }
}

/// Build the count query for `source` restricted by `filter`.
fn build_query(source: Source, filter: &CountFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(source.select);

    if let Some(team) = filter.team {
        match source.team {
            TeamLink::Column(column) => {
                query.push(" AND ").push(column).push(" = ").push_bind(team);
            }
            TeamLink::Member(user_column) => {
                query
                    .push(
                        " AND EXISTS (SELECT 1 FROM huddle.team_members m \
                         WHERE m.deleted_at IS NULL AND m.user_id = ",
                    )
                    .push(user_column)
                    .push(" AND m.team_id = ")
                    .push_bind(team)
                    .push(")");
            }
        }
    }

    if let Some(window) = filter.created {
        query
            .push(" AND ")
            .push(source.created_at)
            .push(" >= ")
            .push_bind(window.start)
            .push(" AND ")
            .push(source.created_at)
            .push(" < ")
            .push_bind(window.end);
    }

    if let (Some(column), Some(as_of)) = (source.expires_at, filter.as_of) {
        query.push(" AND ").push(column).push(" > ").push_bind(as_of);
    }

    query
}

/// Analytics store backed by the platform database.
#[derive(Debug, Clone)]
pub struct PgAnalyticsStore {
    pool: PgPool,
}

impl PgAnalyticsStore {
    /// Create a new analytics store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_count(&self, source: Source, filter: CountFilter) -> Result<i64, sqlx::Error> {
        let mut query = build_query(source, &filter);
        query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }
}

impl AnalyticsStore for PgAnalyticsStore {
    fn team_exists(&self, team: TeamId) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM huddle.teams WHERE id = $1 AND deleted_at IS NULL)",
            )
            .bind(team)
            .fetch_one(&self.pool)
            .await?;
            Ok(exists)
        })
    }

    fn count(&self, target: CountTarget, filter: CountFilter) -> StoreFuture<'_, i64> {
        Box::pin(async move { Ok(self.fetch_count(count_source(target), filter).await?) })
    }

    fn count_distinct(&self, target: DistinctTarget, filter: CountFilter) -> StoreFuture<'_, i64> {
        Box::pin(async move { Ok(self.fetch_count(distinct_source(target), filter).await?) })
    }
}
