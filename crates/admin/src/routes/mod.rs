//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                      - Liveness
//! GET  /health/ready                                - Readiness (database)
//!
//! # Analytics
//! GET  /api/v1/admin/analytics/{bundle}             - Installation-wide bundle
//! GET  /api/v1/admin/analytics/teams/{team_id}/{bundle} - Team bundle
//!
//! # Audits & Logs
//! GET  /api/v1/admin/audits?limit=                  - All audit records
//! GET  /api/v1/admin/teams/{team_id}/audits?limit=  - One team's audit records
//! GET  /api/v1/admin/logs                           - Recent server log lines
//!
//! # Configuration
//! GET  /api/v1/admin/config                         - Site configuration (redacted)
//! POST /api/v1/admin/config                         - Replace site configuration
//! POST /api/v1/admin/test_email                     - Send a test message to the caller
//! GET  /api/v1/admin/client_props                   - Public client properties (open)
//! ```

pub mod analytics;
pub mod audits;
pub mod health;
pub mod system;

use axum::{
    Router,
    routing::{get, post},
};

use huddle_core::{Capability, Principal, TeamId};

use crate::authz::authorize;
use crate::error::AdminError;
use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Analytics
        .route(
            "/api/v1/admin/analytics/{bundle}",
            get(analytics::installation),
        )
        .route(
            "/api/v1/admin/analytics/teams/{team_id}/{bundle}",
            get(analytics::team),
        )
        // Audits & logs
        .route("/api/v1/admin/audits", get(audits::all))
        .route("/api/v1/admin/teams/{team_id}/audits", get(audits::team))
        .route("/api/v1/admin/logs", get(system::logs))
        // Configuration
        .route(
            "/api/v1/admin/config",
            get(system::get_config).post(system::save_config),
        )
        .route("/api/v1/admin/test_email", post(system::test_email))
        .route("/api/v1/admin/client_props", get(system::client_props))
}

/// Parse a team ID from the path once the caller holds `capability`.
///
/// The gate runs first so a non-admin is refused whatever the path holds.
fn authorized_team_id(
    principal: &Principal,
    capability: Capability,
    raw: &str,
) -> Result<TeamId, AdminError> {
    authorize(principal, capability)?;
    raw.parse()
        .map_err(|_| AdminError::InvalidScope(format!("invalid team id: {raw}")))
}
