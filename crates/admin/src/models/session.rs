//! Session keys for the admin API.
//!
//! The authentication layer stores the signed-in [`huddle_core::Principal`]
//! in the session; the admin API only reads it.

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current signed-in principal.
    pub const CURRENT_PRINCIPAL: &str = "current_principal";
}
