//! Lockout threshold and lock-window policy.
//!
//! The policy decides *whether* an attempt may proceed and *when* a lock
//! would end; the counter transition itself is applied by the credential
//! store as a single atomic update, so concurrent failed attempts cannot
//! lose increments.

use chrono::{DateTime, Duration, Utc};

use keygate_core::config::auth::AuthConfig;
use keygate_core::{AuthError, AuthResult};
use keygate_entity::Credential;

/// Per-account lockout rules: failure threshold and lock duration.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock.
    max_failed_attempts: i32,
    /// How long a triggered lock lasts.
    lock_duration: Duration,
}

impl LockoutPolicy {
    /// Creates a policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts,
            lock_duration: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    /// The failure threshold.
    pub fn max_failed_attempts(&self) -> i32 {
        self.max_failed_attempts
    }

    /// Rejects the attempt while the record is locked and the lock window
    /// has not elapsed. Runs before any password hashing so a locked
    /// account costs no hash work and cannot be probed for its password.
    pub fn check(&self, credential: &Credential, now: DateTime<Utc>) -> AuthResult<()> {
        if credential.is_locked(now) {
            return Err(AuthError::AccountLocked {
                retry_after_seconds: credential.lock_remaining_seconds(now),
            });
        }
        Ok(())
    }

    /// The instant a lock triggered at `now` would end.
    pub fn lock_candidate(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lock_duration
    }

    /// Whether a post-increment counter value has reached the threshold.
    pub fn locks_at(&self, failed_attempts: i32) -> bool {
        failed_attempts >= self.max_failed_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keygate_entity::CredentialRole;
    use uuid::Uuid;

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

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(&AuthConfig::default())
    }

    #[test]
    fn test_unlocked_passes() {
        let now = Utc::now();
        assert!(policy().check(&credential(), now).is_ok());
    }

    #[test]
    fn test_locked_rejected_with_retry_after() {
        let now = Utc::now();
        let mut cred = credential();
        cred.locked_until = Some(now + Duration::minutes(30));

        match policy().check(&cred, now) {
            Err(AuthError::AccountLocked {
                retry_after_seconds,
            }) => {
                assert!(retry_after_seconds > 0);
                assert!(retry_after_seconds <= 30 * 60);
            }
            other => panic!("expected AccountLocked, got {other:?}"),
        }
    }

    #[test]
    fn test_elapsed_lock_passes() {
        let now = Utc::now();
        let mut cred = credential();
        cred.failed_attempts = 5;
        cred.locked_until = Some(now - Duration::seconds(1));
        assert!(policy().check(&cred, now).is_ok());
    }

    #[test]
    fn test_threshold() {
        let p = policy();
        assert!(!p.locks_at(4));
        assert!(p.locks_at(5));
        assert!(p.locks_at(6));
    }

    #[test]
    fn test_lock_candidate_duration() {
        let now = Utc::now();
        let until = policy().lock_candidate(now);
        assert_eq!((until - now).num_minutes(), 60);
    }
}
