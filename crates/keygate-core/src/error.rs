//! Unified authentication error types for Keygate.
//!
//! All crates map their internal failures into [`AuthError`] for consistent
//! propagation through the ? operator. Variants distinguish the failure
//! kinds a caller is expected to handle; none of them ever carries a
//! password, a raw one-time token, or a TOTP secret in its message.

use std::collections::BTreeMap;
use thiserror::Error;

/// The unified error type for every Keygate operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Client input failed schema validation. Carries the full
    /// field-name -> message map of every violation found.
    #[error("validation failed")]
    Validation {
        /// Per-field violation messages, keyed by field name.
        fields: BTreeMap<String, String>,
    },

    /// Wrong email/password combination. Deliberately does not reveal
    /// whether the email exists.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account is temporarily locked after too many failed attempts.
    #[error("account is locked, retry after {retry_after_seconds}s")]
    AccountLocked {
        /// Seconds remaining until the lock elapses.
        retry_after_seconds: i64,
    },

    /// The account has been deactivated.
    #[error("account is disabled")]
    AccountDisabled,

    /// A verification or reset token was wrong or expired. The two cases
    /// are intentionally indistinguishable to the caller.
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    /// A wrong or out-of-window one-time code.
    #[error("invalid two-factor code")]
    InvalidTotpCode,

    /// A session or pre-auth token is past its expiry.
    #[error("token has expired")]
    TokenExpired,

    /// A session or pre-auth token failed signature or shape checks, or is
    /// of the wrong kind for the endpoint.
    #[error("token is invalid")]
    TokenInvalid,

    /// Registration conflict on the unique email.
    #[error("email is already registered")]
    EmailAlreadyExists,

    /// A required precondition (e.g. verified email) is not met.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An infrastructure fault (store unavailable, etc.). Safe for the
    /// caller to retry with backoff.
    #[error("service unavailable: {message}")]
    ServiceUnavailable {
        /// Human-readable description, sanitized for clients.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An unexpected internal fault.
    #[error("internal error: {0}")]
    Internal(String),

    /// A configuration error detected at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Create a validation error for a single field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), message.into());
        Self::Validation { fields }
    }

    /// Create a validation error from a pre-built field map.
    pub fn validation_map(fields: BTreeMap<String, String>) -> Self {
        Self::Validation { fields }
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a service-unavailable error without a source.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a service-unavailable error wrapping an underlying cause.
    pub fn store_unavailable(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Stable uppercase identifier for the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::InvalidTotpCode => "INVALID_TOTP_CODE",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
            Self::Configuration(_) => "CONFIGURATION",
        }
    }

    /// Whether this error is an expected auth failure the caller handles,
    /// as opposed to an infrastructure fault worth alerting on.
    pub fn is_client_fault(&self) -> bool {
        !matches!(
            self,
            Self::ServiceUnavailable { .. } | Self::Internal(_) | Self::Configuration(_)
        )
    }
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_map_keeps_all_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), "invalid email".to_string());
        fields.insert("password".to_string(), "too short".to_string());
        let err = AuthError::validation_map(fields);
        match err {
            AuthError::Validation { fields } => assert_eq!(fields.len(), 2),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_kind_classification() {
        assert!(AuthError::InvalidCredentials.is_client_fault());
        assert!(!AuthError::service_unavailable("store down").is_client_fault());
        assert_eq!(
            AuthError::AccountLocked {
                retry_after_seconds: 30
            }
            .kind(),
            "ACCOUNT_LOCKED"
        );
    }
}
