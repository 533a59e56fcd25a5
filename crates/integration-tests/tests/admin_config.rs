//! Configuration, test email, audits and logs through the admin service.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::TimeDelta;
use tracing_subscriber::layer::SubscriberExt;

use huddle_admin::error::AdminError;
use huddle_admin::memory::RecordingMailer;
use huddle_admin::models::{REDACTED_SETTING, SiteConfig};
use huddle_core::{AuditId, AuditRecord, TeamId, UserId};
use huddle_integration_tests::{Harness, admin, now};

fn relay_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    config.team_settings.site_name = "Acme Chat".to_string();
    config.service_settings.site_url = "https://chat.acme.example".to_string();
    config.email_settings.smtp_server = "smtp.acme.example".to_string();
    config.email_settings.smtp_username = "relay".to_string();
    config.email_settings.smtp_password = "s3cret".to_string();
    config
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test]
async fn test_save_then_load_is_complete() {
    let h = Harness::new();
    let mut config = relay_config();
    config.email_settings.feedback_name = String::new();

    let saved = h
        .service
        .save_config(&admin(), serde_json::to_value(&config).unwrap())
        .await
        .unwrap();
    let loaded = h.service.config(&admin()).await.unwrap();

    assert_eq!(saved, loaded);
    assert_eq!(loaded.team_settings.site_name, "Acme Chat");
    assert_eq!(loaded.email_settings.feedback_name, "Acme Chat");
    assert!(!loaded.email_settings.feedback_email.is_empty());
    assert!(!loaded.service_settings.listen_address.is_empty());
    assert_ne!(loaded.email_settings.smtp_port, 0);
    assert_eq!(loaded.email_settings.smtp_password, REDACTED_SETTING);
    assert_eq!(h.config.current().email_settings.smtp_password, "s3cret");
}

#[tokio::test]
async fn test_saving_redacted_password_keeps_stored_secret() {
    let h = Harness::new();
    h.service
        .save_config(&admin(), serde_json::to_value(relay_config()).unwrap())
        .await
        .unwrap();

    let mut edited = h.service.config(&admin()).await.unwrap();
    edited.team_settings.site_name = "Acme".to_string();
    h.service
        .save_config(&admin(), serde_json::to_value(&edited).unwrap())
        .await
        .unwrap();

    let stored = h.config.current();
    assert_eq!(stored.team_settings.site_name, "Acme");
    assert_eq!(stored.email_settings.smtp_password, "s3cret");
}

#[tokio::test]
async fn test_invalid_save_leaves_store_unchanged() {
    let h = Harness::new();
    let before = h.config.current();

    let mut config = SiteConfig::default();
    config.team_settings.site_name = "   ".to_string();
    config.team_settings.max_users_per_team = 0;

    let err = h
        .service
        .save_config(&admin(), serde_json::to_value(&config).unwrap())
        .await
        .unwrap_err();

    let AdminError::InvalidDocument(errors) = err else {
        panic!("expected InvalidDocument, got {err:?}");
    };
    assert!(errors.contains("team_settings.site_name"));
    assert!(errors.contains("team_settings.max_users_per_team"));
    assert_eq!(h.config.current(), before);
    assert_eq!(h.config.writes(), 0);
}

#[tokio::test]
async fn test_unknown_keys_are_rejected() {
    let h = Harness::new();
    let mut value = serde_json::to_value(SiteConfig::default()).unwrap();
    value["rate_limit_settings"] = serde_json::json!({"enable": true});

    let err = h.service.save_config(&admin(), value).await.unwrap_err();
    assert!(matches!(err, AdminError::InvalidDocument(_)));
    assert_eq!(h.config.writes(), 0);
}

// =============================================================================
// Test email
// =============================================================================

#[tokio::test]
async fn test_email_goes_to_caller_with_stored_password() {
    let h = Harness::new();
    h.service
        .save_config(&admin(), serde_json::to_value(relay_config()).unwrap())
        .await
        .unwrap();
    let writes = h.config.writes();

    let caller = admin();
    let settings = h.service.config(&caller).await.unwrap().email_settings;
    h.service
        .test_email(&caller, serde_json::to_value(&settings).unwrap())
        .await
        .unwrap();

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, caller.email);
    assert_eq!(sent[0].smtp_server, "smtp.acme.example");
    assert_eq!(sent[0].smtp_password, "s3cret");
    assert_eq!(h.config.writes(), writes);
}

#[tokio::test]
async fn test_email_without_server_is_invalid() {
    let h = Harness::new();
    let settings = SiteConfig::default().email_settings;

    let err = h
        .service
        .test_email(&admin(), serde_json::to_value(&settings).unwrap())
        .await
        .unwrap_err();

    let AdminError::InvalidDocument(errors) = err else {
        panic!("expected InvalidDocument, got {err:?}");
    };
    assert!(errors.contains("email_settings.smtp_server"));
    assert!(h.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_relay_rejection_is_a_delivery_error() {
    let h = Harness::with_mailer(RecordingMailer::rejecting("550 relay denied"));
    let settings = relay_config().email_settings;

    let err = h
        .service
        .test_email(&admin(), serde_json::to_value(&settings).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, AdminError::Delivery(_)));
}

// =============================================================================
// Client properties
// =============================================================================

#[tokio::test]
async fn test_client_properties_never_leak_secrets() {
    let h = Harness::new();
    h.service
        .save_config(&admin(), serde_json::to_value(relay_config()).unwrap())
        .await
        .unwrap();

    let props = h.service.client_properties().await.unwrap();
    assert_eq!(props.get("SiteName").map(String::as_str), Some("Acme Chat"));
    assert_eq!(
        props.get("SiteUrl").map(String::as_str),
        Some("https://chat.acme.example")
    );
    assert!(props.contains_key("Version"));
    assert!(props.contains_key("BuildNumber"));
    assert!(props.values().all(|v| v != "s3cret" && v != "relay"));
}

// =============================================================================
// Audits & logs
// =============================================================================

fn audit(team: Option<TeamId>, minutes_ago: i64, action: &str) -> AuditRecord {
    AuditRecord {
        id: AuditId::new_v4(),
        created_at: now() - TimeDelta::minutes(minutes_ago),
        user_id: UserId::new_v4(),
        team_id: team,
        action: action.to_string(),
        extra_info: String::new(),
        ip_address: "10.0.0.1".to_string(),
        session_id: None,
    }
}

#[tokio::test]
async fn test_audits_newest_first_and_filtered_by_team() {
    let h = Harness::new();
    let alpha = h.store.add_team("alpha");
    let beta = h.store.add_team("beta");
    h.store.record_audit(audit(Some(alpha), 30, "/api/v1/channels/create"));
    h.store.record_audit(audit(Some(beta), 20, "/api/v1/users/login"));
    h.store.record_audit(audit(Some(alpha), 10, "/api/v1/channels/delete"));

    let all = h.service.all_audits(&admin(), None).await.unwrap();
    let actions: Vec<&str> = all.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(
        actions,
        [
            "/api/v1/channels/delete",
            "/api/v1/users/login",
            "/api/v1/channels/create"
        ]
    );

    let team = h.service.team_audits(&admin(), alpha, Some(1)).await.unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0].action, "/api/v1/channels/delete");
}

#[tokio::test]
async fn test_logs_are_non_empty_once_something_was_logged() {
    let h = Harness::new();
    let subscriber = tracing_subscriber::registry().with(h.logs.layer());
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(listen = ":8065", "admin started");
        tracing::warn!("relay slow");
    });

    let lines = h.service.logs(&admin()).unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].text.contains("relay slow"));
    assert!(lines[1].text.contains("admin started"));
    assert!(lines[1].text.contains("listen=:8065"));
}
