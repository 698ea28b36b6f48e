//! Credential role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles carried as a claim in session tokens.
///
/// Roles are ordered by privilege level: Admin > Manager > User. Role
/// changes are made by a higher-privilege actor outside this subsystem;
/// here the role is a pass-through claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credential_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CredentialRole {
    /// Full system administrator.
    Admin,
    /// Can manage content and other users' records.
    Manager,
    /// Default role for self-registered accounts.
    User,
}

impl CredentialRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Admin => 3,
            Self::Manager => 2,
            Self::User => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &CredentialRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::User => "user",
        }
    }
}

impl Default for CredentialRole {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for CredentialRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CredentialRole {
    type Err = keygate_core::AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "user" => Ok(Self::User),
            _ => Err(keygate_core::AuthError::validation(
                "role",
                format!("Invalid role: '{s}'. Expected one of: admin, manager, user"),
            )),
        }
    }
}
