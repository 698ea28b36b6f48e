//! The credential store contract and its implementations.
//!
//! Every authentication operation acts on a freshly loaded
//! [`keygate_entity::Credential`] and persists its transition through this
//! trait. The one place that demands explicit concurrency control — the
//! failed-attempt counter — is expressed as a single atomic operation
//! ([`CredentialStore::record_failed_attempt`]) rather than a read-then-write,
//! so concurrent failures cannot lose increments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use keygate_core::AuthResult;
use keygate_entity::{Credential, NewCredential};

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Counter and lock state after an atomic failed-attempt transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutSnapshot {
    /// Post-update consecutive failure count.
    pub failed_attempts: i32,
    /// Post-update lock expiry, if the transition engaged (or kept) a lock.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LockoutSnapshot {
    /// Whether the account is locked as of this snapshot.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.locked_until, Some(until) if now < until)
    }
}

/// Durable keyed store for credential records, addressable by id and by
/// unique email (plus by outstanding one-time token digests).
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Find a credential by primary key.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Credential>>;

    /// Find a credential by normalized email.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Credential>>;

    /// Find the credential holding this outstanding verification digest.
    async fn find_by_verification_digest(&self, digest: &str) -> AuthResult<Option<Credential>>;

    /// Find the credential holding this outstanding reset digest.
    async fn find_by_reset_digest(&self, digest: &str) -> AuthResult<Option<Credential>>;

    /// Create a new credential record.
    ///
    /// Fails with `EmailAlreadyExists` on a unique-email conflict.
    async fn create(&self, data: &NewCredential) -> AuthResult<Credential>;

    /// Atomically record one failed login attempt.
    ///
    /// In a single transition: increments the counter (or restarts it at 1
    /// when an elapsed lock is still on the record), and sets
    /// `locked_until = lock_until` when the new count reaches `threshold`.
    /// An attempt that raced past the lock check while a lock is active
    /// leaves the record unchanged, so the counter never passes the
    /// threshold. Returns the post-update state.
    async fn record_failed_attempt(
        &self,
        id: Uuid,
        threshold: i32,
        lock_until: DateTime<Utc>,
    ) -> AuthResult<LockoutSnapshot>;

    /// Reset the failure counter to zero and clear any lock.
    async fn clear_lockout(&self, id: Uuid) -> AuthResult<()>;

    /// Replace the password digest. Also clears lockout state and any
    /// outstanding reset token: a successful password change always
    /// unlocks the account and consumes the reset window.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> AuthResult<()>;

    /// Store a new verification token digest and expiry, superseding any
    /// outstanding one.
    async fn set_verification_token(
        &self,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Mark the email verified and clear the verification digest and
    /// expiry together.
    async fn mark_verified(&self, id: Uuid) -> AuthResult<()>;

    /// Store a new reset token digest and expiry, superseding any
    /// outstanding one.
    async fn set_reset_token(
        &self,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Store a pending (unconfirmed) TOTP secret, overwriting any prior
    /// pending secret.
    async fn set_pending_totp_secret(&self, id: Uuid, secret: &str) -> AuthResult<()>;

    /// Promote the pending TOTP secret to active.
    async fn enable_totp(&self, id: Uuid) -> AuthResult<()>;

    /// Clear the TOTP secret and enabled flag together.
    async fn disable_totp(&self, id: Uuid) -> AuthResult<()>;

    /// Activate or deactivate the account (soft delete).
    async fn set_active(&self, id: Uuid, active: bool) -> AuthResult<()>;
}
