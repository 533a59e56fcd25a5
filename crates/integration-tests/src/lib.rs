//! Integration tests for Huddle admin.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p huddle-integration-tests
//! ```
//!
//! The tests run against the in-memory adapters from
//! `huddle_admin::memory`, so no database or SMTP relay is required.
//!
//! # Test Categories
//!
//! - `admin_authorization` - Non-admin callers are refused without side effects
//! - `admin_analytics` - Bundle ordering, team fixtures and day buckets
//! - `admin_config` - Config round-trip, test email, logs and client properties
//! - `admin_http` - Router status codes through the session layer
//!
//! This module holds the fixtures the test files share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use huddle_admin::analytics::FixedClock;
use huddle_admin::logs::LogBuffer;
use huddle_admin::memory::{MemoryConfigStore, MemoryStore, RecordingMailer};
use huddle_admin::models::SiteConfig;
use huddle_admin::services::AdminService;
use huddle_core::{Email, Principal, Role, UserId};

/// Everything a test needs to drive and observe an [`AdminService`].
pub struct Harness {
    pub service: AdminService,
    pub store: MemoryStore,
    pub config: MemoryConfigStore,
    pub mailer: RecordingMailer,
    pub logs: LogBuffer,
}

impl Harness {
    /// Service over empty stores, the default config and a fixed clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::new())
    }

    /// Same as [`Harness::new`] but with a specific mailer.
    #[must_use]
    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let store = MemoryStore::new();
        let config = MemoryConfigStore::new(SiteConfig::default());
        let logs = LogBuffer::new(100);

        let service = AdminService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(config.clone()),
            Arc::new(mailer.clone()),
            logs.clone(),
        )
        .with_clock(Arc::new(FixedClock::utc(now())));

        Self {
            service,
            store,
            config,
            mailer,
            logs,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference instant for every test: 2026-06-15 12:00 UTC.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// A system administrator.
#[must_use]
pub fn admin() -> Principal {
    principal(Role::SystemAdmin, "admin@huddle.example")
}

/// An ordinary member.
#[must_use]
pub fn member() -> Principal {
    principal(Role::Member, "member@huddle.example")
}

fn principal(role: Role, email: &str) -> Principal {
    Principal {
        id: UserId::new_v4(),
        email: Email::parse(email).unwrap_or_else(|e| panic!("fixture email {email}: {e}")),
        role,
    }
}
