//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::AdminService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    admin: AdminService,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `admin` - Admin operations over the configured stores
    /// * `pool` - Database pool checked by the readiness check, if any
    #[must_use]
    pub fn new(admin: AdminService, pool: Option<PgPool>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { admin, pool }),
        }
    }

    /// Get a reference to the admin service.
    #[must_use]
    pub fn admin(&self) -> &AdminService {
        &self.inner.admin
    }

    /// Get a reference to the database pool, if the state has one.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
