//! Unified error handling for admin.
//!
//! [`AdminError`] is the taxonomy every admin operation returns;
//! [`AppError`] maps it (plus transport-level failures) onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::authz::Denied;
use crate::db::RepositoryError;
use crate::models::ValidationErrors;
use crate::services::DeliveryError;

/// Failure of an administrative operation.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The caller is not a system administrator. Raised before any work.
    #[error("you do not have the appropriate permissions")]
    Unauthorized,

    /// Unknown analytics bundle or team.
    #[error("invalid scope: {0}")]
    InvalidScope(String),

    /// A configuration document failed structural validation.
    #[error("invalid configuration: {0}")]
    InvalidDocument(ValidationErrors),

    /// The mail relay was reached but delivery failed.
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// The underlying store failed; never retried here.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),
}

impl From<Denied> for AdminError {
    fn from(_: Denied) -> Self {
        Self::Unauthorized
    }
}

impl From<ValidationErrors> for AdminError {
    fn from(errors: ValidationErrors) -> Self {
        Self::InvalidDocument(errors)
    }
}

/// Application-level error type for the admin HTTP API.
#[derive(Debug, Error)]
pub enum AppError {
    /// An admin operation failed.
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// No authenticated principal on the session.
    #[error("Unauthenticated")]
    Unauthenticated,
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Admin(AdminError::Unauthorized) => StatusCode::FORBIDDEN,
            Self::Admin(AdminError::InvalidScope(_) | AdminError::InvalidDocument(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Admin(AdminError::Delivery(_)) => StatusCode::BAD_GATEWAY,
            Self::Admin(AdminError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Admin(AdminError::Store(_)) => ErrorBody {
                error: "Internal server error".to_string(),
                fields: Vec::new(),
            },
            Self::Admin(AdminError::InvalidDocument(errors)) => ErrorBody {
                error: "Invalid configuration".to_string(),
                fields: errors.iter().map(ToString::to_string).collect(),
            },
            _ => ErrorBody {
                error: self.to_string(),
                fields: Vec::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context from the session principal.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_admin_error_display() {
        let err = AdminError::InvalidScope("unknown analytics bundle: nope".to_string());
        assert_eq!(err.to_string(), "invalid scope: unknown analytics bundle: nope");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AdminError::Unauthorized.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AdminError::InvalidScope("x".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AdminError::Delivery(DeliveryError::Rejected("x".to_string())).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AdminError::Store(RepositoryError::Unavailable("x".to_string())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(get_status(AppError::Unauthenticated), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_document_maps_to_bad_request() {
        let errors = ValidationErrors::from(vec![FieldError::new(
            "team_settings.site_name",
            "must not be empty",
        )]);
        assert_eq!(
            get_status(AdminError::InvalidDocument(errors).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_denied_becomes_unauthorized() {
        let err = AdminError::from(Denied {
            capability: huddle_core::Capability::ReadLogs,
        });
        assert!(matches!(err, AdminError::Unauthorized));
    }
}
