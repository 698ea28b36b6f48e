//! JWT claims structure used in session and pre-authentication tokens.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use keygate_entity::CredentialRole;

/// JWT claims payload embedded in every bearer token.
///
/// Carries identity and role only: no password material and no
/// second-factor secret ever enters a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the credential record ID.
    pub sub: Uuid,
    /// Account email at the time of issuance.
    pub email: String,
    /// Role at the time of issuance.
    pub role: CredentialRole,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// JWT ID.
    pub jti: Uuid,
    /// Token kind: full session or pre-authentication.
    pub token_type: TokenType,
}

/// Distinguishes full session tokens from the restricted token issued
/// between password success and second-factor completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Full session token granting API access.
    Session,
    /// Short-lived token accepted only by the TOTP login-verification step.
    PreAuth,
}

impl Claims {
    /// Returns the credential ID from the subject claim.
    pub fn credential_id(&self) -> Uuid {
        self.sub
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
