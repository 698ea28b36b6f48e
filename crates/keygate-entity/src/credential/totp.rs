//! Second-factor enrollment state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Enrollment state of the TOTP second factor for one credential record.
///
/// Derived from the record's enabled flag and secret presence rather than
/// stored, so the two columns can never disagree with the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotpState {
    /// No secret present; logins use password only.
    Disabled,
    /// A secret has been provisioned but not yet confirmed with a code.
    PendingEnrollment,
    /// Enrollment confirmed; logins require a one-time code.
    Enabled,
}

impl TotpState {
    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::PendingEnrollment => "pending_enrollment",
            Self::Enabled => "enabled",
        }
    }
}

impl fmt::Display for TotpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
