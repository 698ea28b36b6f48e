//! Two-factor authentication configuration.

use serde::{Deserialize, Serialize};

/// TOTP second-factor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpConfig {
    /// Issuer name embedded in provisioning URLs.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// Number of digits per one-time code.
    #[serde(default = "default_digits")]
    pub digits: usize,
    /// Time step in seconds.
    #[serde(default = "default_step")]
    pub step_seconds: u64,
    /// Accepted clock-drift tolerance in steps on either side.
    #[serde(default = "default_skew")]
    pub skew: u8,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            digits: default_digits(),
            step_seconds: default_step(),
            skew: default_skew(),
        }
    }
}

fn default_issuer() -> String {
    "Keygate".to_string()
}

fn default_digits() -> usize {
    6
}

fn default_step() -> u64 {
    30
}

fn default_skew() -> u8 {
    1
}
