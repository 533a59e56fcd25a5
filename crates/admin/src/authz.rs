//! Authorization gate for administrative operations.
//!
//! Every admin operation calls [`authorize`] before touching any store. A
//! successful check returns an [`AdminGrant`], a zero-sized proof that can
//! only be minted here; readers that must never run on a denied path (the
//! log snapshot) take it as a parameter.

use thiserror::Error;

use huddle_core::{Capability, Principal};

/// Proof that the caller passed the gate.
///
/// It cannot be constructed outside this module, so holding one means
/// [`authorize`] succeeded for the current request.
#[derive(Debug, Clone, Copy)]
pub struct AdminGrant {
    _private: (),
}

/// The caller's role lacks the required capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("missing capability {}", capability.as_str())]
pub struct Denied {
    pub capability: Capability,
}

/// Check that `principal` may perform an operation needing `capability`.
///
/// Pure check: no I/O, no side effects.
///
/// # Errors
///
/// Returns [`Denied`] when the principal's role does not hold `capability`.
pub fn authorize(principal: &Principal, capability: Capability) -> Result<AdminGrant, Denied> {
    if principal.role.has(capability) {
        Ok(AdminGrant { _private: () })
    } else {
        tracing::warn!(
            user_id = %principal.id,
            role = %principal.role,
            capability = capability.as_str(),
            "Admin operation denied"
        );
        Err(Denied { capability })
    }
}

#[cfg(test)]
pub(crate) const fn test_grant() -> AdminGrant {
    AdminGrant { _private: () }
}
