//! Huddle admin library.
//!
//! Administrative telemetry and configuration for a Huddle installation:
//! usage analytics, audit trails, recent server logs, the site
//! configuration document and a mail relay check. Every operation is gated
//! on the system-administrator role.
//!
//! # Security
//!
//! This crate can read and replace the whole site configuration, including
//! SMTP credentials. Secrets are redacted on every read path.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod logs;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
