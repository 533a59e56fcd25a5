//! Roles, capabilities and the authenticated principal.

use serde::{Deserialize, Serialize};

use super::{Email, UserId};

/// Platform role of an authenticated user.
///
/// There are exactly two tiers: system administrators, who may use every
/// administrative operation, and everyone else, who may use none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to analytics, audits, logs and configuration.
    SystemAdmin,
    /// Ordinary authenticated user.
    Member,
}

/// An administrative operation a role may be allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ReadAnalytics,
    ReadAudits,
    ReadLogs,
    ReadConfig,
    WriteConfig,
    SendTestEmail,
}

impl Capability {
    /// Every administrative capability.
    pub const ALL: [Self; 6] = [
        Self::ReadAnalytics,
        Self::ReadAudits,
        Self::ReadLogs,
        Self::ReadConfig,
        Self::WriteConfig,
        Self::SendTestEmail,
    ];

    /// Stable label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadAnalytics => "read_analytics",
            Self::ReadAudits => "read_audits",
            Self::ReadLogs => "read_logs",
            Self::ReadConfig => "read_config",
            Self::WriteConfig => "write_config",
            Self::SendTestEmail => "send_test_email",
        }
    }
}

impl Role {
    /// Capabilities granted to this role.
    #[must_use]
    pub const fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::SystemAdmin => &Capability::ALL,
            Self::Member => &[],
        }
    }

    /// Whether this role holds `capability`.
    #[must_use]
    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SystemAdmin => write!(f, "system_admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system_admin" => Ok(Self::SystemAdmin),
            "member" => Ok(Self::Member),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// The authenticated caller of an operation.
///
/// Created by the authentication layer when a session starts; the admin
/// layer only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User the session belongs to.
    pub id: UserId,
    /// Address test emails are delivered to.
    pub email: Email,
    /// Role for the lifetime of the session.
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_admin_holds_every_capability() {
        for capability in Capability::ALL {
            assert!(Role::SystemAdmin.has(capability));
        }
    }

    #[test]
    fn test_member_holds_nothing() {
        assert!(Role::Member.capabilities().is_empty());
        assert!(!Role::Member.has(Capability::ReadLogs));
    }

    #[test]
    fn test_role_string_roundtrip() {
        for role in [Role::SystemAdmin, Role::Member] {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
        assert!("super_admin".parse::<Role>().is_err());
    }
}
