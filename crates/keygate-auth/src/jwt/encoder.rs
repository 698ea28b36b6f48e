//! Bearer token creation with configurable signing and TTL.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use keygate_core::config::token::TokenConfig;
use keygate_core::{AuthError, AuthResult};
use keygate_entity::Credential;

use super::claims::{Claims, TokenType};

/// Creates signed session and pre-authentication tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Full session token TTL in hours.
    session_ttl_hours: i64,
    /// Pre-auth token TTL in minutes.
    pre_auth_ttl_minutes: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("pre_auth_ttl_minutes", &self.pre_auth_ttl_minutes)
            .finish()
    }
}

/// A signed bearer token and its expiry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedBearer {
    /// The encoded, signed token.
    pub token: String,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
}

impl TokenIssuer {
    /// Creates a new issuer from token configuration.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            session_ttl_hours: config.session_ttl_hours as i64,
            pre_auth_ttl_minutes: config.pre_auth_ttl_minutes as i64,
        }
    }

    /// Mints a full session token for an authenticated credential.
    pub fn issue_session(&self, credential: &Credential) -> AuthResult<IssuedBearer> {
        self.issue(
            credential,
            TokenType::Session,
            chrono::Duration::hours(self.session_ttl_hours),
        )
    }

    /// Mints the restricted pre-authentication token issued after password
    /// success when a second factor is still outstanding.
    pub fn issue_pre_auth(&self, credential: &Credential) -> AuthResult<IssuedBearer> {
        self.issue(
            credential,
            TokenType::PreAuth,
            chrono::Duration::minutes(self.pre_auth_ttl_minutes),
        )
    }

    fn issue(
        &self,
        credential: &Credential,
        token_type: TokenType,
        ttl: chrono::Duration,
    ) -> AuthResult<IssuedBearer> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = Claims {
            sub: credential.id,
            email: credential.email.clone(),
            role: credential.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("Failed to encode token: {e}")))?;

        Ok(IssuedBearer { token, expires_at })
    }
}
