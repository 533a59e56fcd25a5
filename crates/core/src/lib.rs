//! Huddle Core - Shared types library.
//!
//! This crate provides the domain types shared by the Huddle admin
//! components:
//! - `admin` - Access-gated analytics, audits, logs and site configuration
//! - `cli` - Command-line tools for migrations and config checks
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, roles, metric rows and audit records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
