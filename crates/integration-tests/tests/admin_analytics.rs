//! Analytics bundles computed end to end over the in-memory store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::TimeDelta;

use huddle_admin::analytics::Scope;
use huddle_admin::error::AdminError;
use huddle_admin::memory::{ChannelKind, IntegrationKind, NewPost};
use huddle_core::TeamId;
use huddle_integration_tests::{Harness, admin, now};

/// A team with 2 open channels, 1 private channel, 1 post and 2 members who
/// have both posted at some point.
fn seed_team(h: &Harness, name: &str) -> TeamId {
    let team = h.store.add_team(name);
    let open = h.store.add_channel(team, ChannelKind::Open);
    h.store.add_channel(team, ChannelKind::Open);
    h.store.add_channel(team, ChannelKind::Private);

    let first = h.store.add_user();
    let second = h.store.add_user();
    h.store.join_team(first, team);
    h.store.join_team(second, team);

    let at = now() - TimeDelta::days(3);
    h.store.add_post(NewPost::new(open, first, at));
    // A second author whose post was later removed with its channel.
    let scratch = h.store.add_channel(team, ChannelKind::Private);
    h.store.add_post(NewPost::new(scratch, second, at));
    h.store.delete_channel(scratch);

    team
}

#[tokio::test]
async fn test_standard_bundle_for_team() {
    let h = Harness::new();
    let team = seed_team(&h, "alpha");

    let rows = h
        .service
        .analytics(&admin(), Scope::Team(team), "standard")
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
    let values: Vec<i64> = rows.iter().map(|row| row.value).collect();
    assert_eq!(values, [2, 1, 1, 2]);
}

#[tokio::test]
async fn test_standard_bundle_for_installation_ends_with_team_count() {
    let h = Harness::new();
    seed_team(&h, "alpha");
    seed_team(&h, "beta");

    let rows = h
        .service
        .analytics(&admin(), Scope::Installation, "standard")
        .await
        .unwrap();

    assert_eq!(rows.len(), 5);
    assert_eq!(rows.row(4).unwrap().name, "team_count");
    assert_eq!(rows.value_of("team_count"), Some(2));
    assert_eq!(rows.value_of("channel_open_count"), Some(4));
    assert_eq!(rows.value_of("unique_user_count"), Some(4));
}

#[tokio::test]
async fn test_extra_counts_order_at_both_scopes() {
    let h = Harness::new();
    let team = seed_team(&h, "alpha");
    let user = h.store.add_user();
    h.store.join_team(user, team);
    h.store
        .add_session(user, now() + TimeDelta::hours(1));
    h.store.add_integration(team, IntegrationKind::SlashCommand);

    let expected = [
        "file_post_count",
        "hashtag_post_count",
        "incoming_webhook_count",
        "outgoing_webhook_count",
        "command_count",
        "session_count",
    ];

    for scope in [Scope::Installation, Scope::Team(team)] {
        let rows = h
            .service
            .analytics(&admin(), scope, "extra_counts")
            .await
            .unwrap();
        assert_eq!(rows.names(), expected);
        assert!(rows.value_of("session_count").unwrap() >= 1);
        assert_eq!(rows.value_of("command_count"), Some(1));
    }
}

#[tokio::test]
async fn test_yesterday_post_lands_in_first_bucket_only() {
    let h = Harness::new();
    let team = h.store.add_team("alpha");
    let channel = h.store.add_channel(team, ChannelKind::Open);
    let user = h.store.add_user();
    h.store.join_team(user, team);

    let now = now();
    h.store
        .add_post(NewPost::new(channel, user, now - TimeDelta::days(1)));
    h.store.add_post(NewPost::new(channel, user, now));

    let rows = h
        .service
        .analytics(&admin(), Scope::Team(team), "post_counts_day")
        .await
        .unwrap();

    assert_eq!(rows.len(), 30);
    let total: i64 = rows.iter().map(|row| row.value).sum();
    assert_eq!(total, 1);
    assert_eq!(rows.row(0).unwrap().value, 1);
    assert_eq!(
        rows.row(0).unwrap().date,
        Some(now.date_naive() - TimeDelta::days(1))
    );
}

#[tokio::test]
async fn test_unknown_team_is_invalid_scope() {
    let h = Harness::new();
    let err = h
        .service
        .analytics(&admin(), Scope::Team(TeamId::new_v4()), "standard")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::InvalidScope(_)));
}

#[tokio::test]
async fn test_store_failure_fails_the_request() {
    let h = Harness::new();
    seed_team(&h, "alpha");
    h.store.set_failing(true);

    let err = h
        .service
        .analytics(&admin(), Scope::Installation, "standard")
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Store(_)));
}
