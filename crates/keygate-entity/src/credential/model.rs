//! Credential record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::CredentialRole;
use super::totp::TotpState;

/// The durable authentication state for one account.
///
/// One record exists per account, unique on `email`. Every authentication
/// operation loads, transitions, and persists this record; it is never
/// hard-deleted (deactivation sets `active = false`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Credential {
    /// Stable identifier, assigned at creation, immutable.
    pub id: Uuid,
    /// Normalized (trimmed, lower-cased) unique email.
    pub email: String,
    /// Given name captured at registration.
    pub first_name: String,
    /// Family name captured at registration.
    pub last_name: String,
    /// Argon2id password digest. Never the plaintext password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role claim carried into session tokens.
    pub role: CredentialRole,
    /// Whether the email has been verified.
    pub verified: bool,
    /// Digest of the outstanding email-verification token, if any.
    #[serde(skip_serializing)]
    pub verification_digest: Option<String>,
    /// Expiry of the outstanding verification token. Always set and
    /// cleared together with `verification_digest`.
    pub verification_expires_at: Option<DateTime<Utc>>,
    /// Digest of the outstanding password-reset token, if any.
    #[serde(skip_serializing)]
    pub reset_digest: Option<String>,
    /// Expiry of the outstanding reset token. Always set and cleared
    /// together with `reset_digest`.
    pub reset_expires_at: Option<DateTime<Utc>>,
    /// Whether TOTP enrollment has been confirmed.
    pub totp_enabled: bool,
    /// Base32 TOTP secret, present while enrollment is pending or enabled.
    #[serde(skip_serializing)]
    pub totp_secret: Option<String>,
    /// Consecutive failed login attempts.
    pub failed_attempts: i32,
    /// Account locked until this time, if locked.
    pub locked_until: Option<DateTime<Utc>>,
    /// False once the account has been deactivated.
    pub active: bool,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Whether the account is locked at the given instant.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        match self.locked_until {
            Some(until) => now < until,
            None => false,
        }
    }

    /// Seconds remaining on the lock at the given instant (0 if unlocked).
    pub fn lock_remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        match self.locked_until {
            Some(until) if now < until => (until - now).num_seconds().max(1),
            _ => 0,
        }
    }

    /// Current second-factor enrollment state, derived from the
    /// enabled flag and secret presence.
    pub fn totp_state(&self) -> TotpState {
        match (self.totp_enabled, self.totp_secret.as_deref()) {
            (true, Some(_)) => TotpState::Enabled,
            (false, Some(_)) => TotpState::PendingEnrollment,
            _ => TotpState::Disabled,
        }
    }

    /// Whether an email-verification token is outstanding at `now`.
    pub fn has_live_verification_token(&self, now: DateTime<Utc>) -> bool {
        matches!(
            (&self.verification_digest, self.verification_expires_at),
            (Some(_), Some(exp)) if now < exp
        )
    }

    /// Whether a password-reset token is outstanding at `now`.
    pub fn has_live_reset_token(&self, now: DateTime<Utc>) -> bool {
        matches!(
            (&self.reset_digest, self.reset_expires_at),
            (Some(_), Some(exp)) if now < exp
        )
    }

    /// The public identity view of this record.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            verified: self.verified,
            totp_enabled: self.totp_enabled,
        }
    }
}

/// Data required to create a new credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCredential {
    /// Normalized email.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: CredentialRole,
}

/// The client-safe identity view returned by `getCurrentIdentity`.
///
/// Carries no secret material: no digests, no TOTP secret, no lock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account identifier.
    pub id: Uuid,
    /// Account email.
    pub email: String,
    /// Role claim.
    pub role: CredentialRole,
    /// Whether the email has been verified.
    pub verified: bool,
    /// Whether a second factor is enforced at login.
    pub totp_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential() -> Credential {
        let now = Utc::now();
        Credential {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: CredentialRole::User,
            verified: false,
            verification_digest: None,
            verification_expires_at: None,
            reset_digest: None,
            reset_expires_at: None,
            totp_enabled: false,
            totp_secret: None,
            failed_attempts: 0,
            locked_until: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lock_state() {
        let now = Utc::now();
        let mut cred = credential();
        assert!(!cred.is_locked(now));
        assert_eq!(cred.lock_remaining_seconds(now), 0);

        cred.locked_until = Some(now + Duration::minutes(10));
        assert!(cred.is_locked(now));
        assert!(cred.lock_remaining_seconds(now) > 0);

        cred.locked_until = Some(now - Duration::seconds(1));
        assert!(!cred.is_locked(now));
        assert_eq!(cred.lock_remaining_seconds(now), 0);
    }

    #[test]
    fn test_totp_state_derivation() {
        let mut cred = credential();
        assert_eq!(cred.totp_state(), TotpState::Disabled);

        cred.totp_secret = Some("JBSWY3DPEHPK3PXP".to_string());
        assert_eq!(cred.totp_state(), TotpState::PendingEnrollment);

        cred.totp_enabled = true;
        assert_eq!(cred.totp_state(), TotpState::Enabled);
    }

    #[test]
    fn test_live_token_windows() {
        let now = Utc::now();
        let mut cred = credential();
        assert!(!cred.has_live_verification_token(now));

        cred.verification_digest = Some("abc".to_string());
        cred.verification_expires_at = Some(now + Duration::hours(1));
        assert!(cred.has_live_verification_token(now));

        cred.verification_expires_at = Some(now - Duration::seconds(1));
        assert!(!cred.has_live_verification_token(now));
    }
}
