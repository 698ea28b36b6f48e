//! Bearer token and one-time token configuration.

use serde::{Deserialize, Serialize};

/// Signed bearer token and single-use token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Full session token TTL in hours.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u64,
    /// Pre-authentication token TTL in minutes.
    #[serde(default = "default_pre_auth_ttl")]
    pub pre_auth_ttl_minutes: u64,
    /// Email verification token TTL in hours.
    #[serde(default = "default_verification_ttl")]
    pub verification_ttl_hours: u64,
    /// Password reset token TTL in minutes.
    #[serde(default = "default_reset_ttl")]
    pub reset_ttl_minutes: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            session_ttl_hours: default_session_ttl(),
            pre_auth_ttl_minutes: default_pre_auth_ttl(),
            verification_ttl_hours: default_verification_ttl(),
            reset_ttl_minutes: default_reset_ttl(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_session_ttl() -> u64 {
    72
}

fn default_pre_auth_ttl() -> u64 {
    5
}

fn default_verification_ttl() -> u64 {
    24
}

fn default_reset_ttl() -> u64 {
    60
}
