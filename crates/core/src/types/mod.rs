//! Core types for Huddle.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod analytics;
pub mod audit;
pub mod email;
pub mod id;
pub mod role;

pub use analytics::{AnalyticsRows, MetricRow};
pub use audit::AuditRecord;
pub use email::{Email, EmailError};
pub use id::*;
pub use role::{Capability, Principal, Role};
