//! In-memory credential store using a Tokio mutex for single-node use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use keygate_core::{AuthError, AuthResult};
use keygate_entity::{Credential, NewCredential};

use super::{CredentialStore, LockoutSnapshot};

/// In-memory credential store holding records behind a Tokio mutex.
///
/// Suitable for single-node deployments and tests. Every transition runs
/// while holding the mutex, so the failed-attempt update is atomic with
/// respect to concurrent attempts, matching the PostgreSQL implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    /// Protected record map, keyed by credential id.
    records: Arc<Mutex<HashMap<Uuid, Credential>>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a direct mutation to one record, bypassing the transition
    /// methods. Intended for tests and operational tooling (e.g. backdating
    /// a lock window).
    pub async fn update_with<F>(&self, id: Uuid, f: F) -> AuthResult<()>
    where
        F: FnOnce(&mut Credential),
    {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AuthError::internal(format!("Credential {id} not found")))?;
        f(record);
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn modify<F, T>(&self, id: Uuid, f: F) -> AuthResult<T>
    where
        F: FnOnce(&mut Credential) -> AuthResult<T>,
    {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AuthError::internal(format!("Credential {id} not found")))?;
        let out = f(record)?;
        record.updated_at = Utc::now();
        Ok(out)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Credential>> {
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Credential>> {
        let needle = email.to_lowercase();
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|c| c.email == needle)
            .cloned())
    }

    async fn find_by_verification_digest(&self, digest: &str) -> AuthResult<Option<Credential>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|c| c.verification_digest.as_deref() == Some(digest))
            .cloned())
    }

    async fn find_by_reset_digest(&self, digest: &str) -> AuthResult<Option<Credential>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|c| c.reset_digest.as_deref() == Some(digest))
            .cloned())
    }

    async fn create(&self, data: &NewCredential) -> AuthResult<Credential> {
        let mut records = self.records.lock().await;

        if records.values().any(|c| c.email == data.email) {
            return Err(AuthError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let credential = Credential {
            id: Uuid::new_v4(),
            email: data.email.clone(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
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
        };

        records.insert(credential.id, credential.clone());
        Ok(credential)
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        threshold: i32,
        lock_until: DateTime<Utc>,
    ) -> AuthResult<LockoutSnapshot> {
        // The mutex is held for the whole read-modify-write, mirroring the
        // single-statement semantics of the PostgreSQL implementation.
        self.modify(id, |record| {
            let now = Utc::now();
            match record.locked_until {
                // An attempt that raced past the guard while the lock is
                // active leaves the record unchanged.
                Some(until) if until > now => {}
                // An elapsed lock restarts the counter.
                Some(_) => {
                    record.failed_attempts = 1;
                    record.locked_until = if 1 >= threshold { Some(lock_until) } else { None };
                }
                None => {
                    record.failed_attempts += 1;
                    if record.failed_attempts >= threshold {
                        record.locked_until = Some(lock_until);
                    }
                }
            }

            Ok(LockoutSnapshot {
                failed_attempts: record.failed_attempts,
                locked_until: record.locked_until,
            })
        })
        .await
    }

    async fn clear_lockout(&self, id: Uuid) -> AuthResult<()> {
        self.modify(id, |record| {
            record.failed_attempts = 0;
            record.locked_until = None;
            Ok(())
        })
        .await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AuthResult<()> {
        self.modify(id, |record| {
            record.password_hash = password_hash.to_string();
            record.failed_attempts = 0;
            record.locked_until = None;
            record.reset_digest = None;
            record.reset_expires_at = None;
            Ok(())
        })
        .await
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.modify(id, |record| {
            record.verification_digest = Some(digest.to_string());
            record.verification_expires_at = Some(expires_at);
            Ok(())
        })
        .await
    }

    async fn mark_verified(&self, id: Uuid) -> AuthResult<()> {
        self.modify(id, |record| {
            record.verified = true;
            record.verification_digest = None;
            record.verification_expires_at = None;
            Ok(())
        })
        .await
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        self.modify(id, |record| {
            record.reset_digest = Some(digest.to_string());
            record.reset_expires_at = Some(expires_at);
            Ok(())
        })
        .await
    }

    async fn set_pending_totp_secret(&self, id: Uuid, secret: &str) -> AuthResult<()> {
        self.modify(id, |record| {
            record.totp_secret = Some(secret.to_string());
            record.totp_enabled = false;
            Ok(())
        })
        .await
    }

    async fn enable_totp(&self, id: Uuid) -> AuthResult<()> {
        self.modify(id, |record| {
            if record.totp_secret.is_none() {
                return Err(AuthError::internal(format!(
                    "Credential {id} has no pending TOTP secret"
                )));
            }
            record.totp_enabled = true;
            Ok(())
        })
        .await
    }

    async fn disable_totp(&self, id: Uuid) -> AuthResult<()> {
        self.modify(id, |record| {
            record.totp_enabled = false;
            record.totp_secret = None;
            Ok(())
        })
        .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AuthResult<()> {
        self.modify(id, |record| {
            record.active = active;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use keygate_entity::CredentialRole;

    fn new_credential(email: &str) -> NewCredential {
        NewCredential {
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: CredentialRole::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = MemoryCredentialStore::new();
        let created = store.create(&new_credential("a@b.com")).await.unwrap();

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@b.com");
        assert!(!by_id.verified);
        assert!(by_id.active);

        let by_email = store.find_by_email("A@B.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflict() {
        let store = MemoryCredentialStore::new();
        store.create(&new_credential("a@b.com")).await.unwrap();
        assert!(matches!(
            store.create(&new_credential("a@b.com")).await,
            Err(AuthError::EmailAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_failed_attempt_locks_at_threshold() {
        let store = MemoryCredentialStore::new();
        let cred = store.create(&new_credential("a@b.com")).await.unwrap();
        let lock_until = Utc::now() + Duration::hours(1);

        for expected in 1..=4 {
            let snap = store
                .record_failed_attempt(cred.id, 5, lock_until)
                .await
                .unwrap();
            assert_eq!(snap.failed_attempts, expected);
            assert!(snap.locked_until.is_none());
        }

        let snap = store
            .record_failed_attempt(cred.id, 5, lock_until)
            .await
            .unwrap();
        assert_eq!(snap.failed_attempts, 5);
        assert_eq!(snap.locked_until, Some(lock_until));
    }

    #[tokio::test]
    async fn test_elapsed_lock_restarts_counter() {
        let store = MemoryCredentialStore::new();
        let cred = store.create(&new_credential("a@b.com")).await.unwrap();

        store
            .update_with(cred.id, |c| {
                c.failed_attempts = 5;
                c.locked_until = Some(Utc::now() - Duration::seconds(1));
            })
            .await
            .unwrap();

        let snap = store
            .record_failed_attempt(cred.id, 5, Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(snap.failed_attempts, 1);
        assert!(snap.locked_until.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_failures_never_lose_updates() {
        let store = MemoryCredentialStore::new();
        let cred = store.create(&new_credential("a@b.com")).await.unwrap();
        let lock_until = Utc::now() + Duration::hours(1);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let id = cred.id;
            handles.push(tokio::spawn(async move {
                store.record_failed_attempt(id, 5, lock_until).await
            }));
        }

        let mut locked_transitions = 0;
        for handle in handles {
            let snap = handle.await.unwrap().unwrap();
            if snap.failed_attempts == 5 && snap.locked_until == Some(lock_until) {
                locked_transitions += 1;
            }
        }

        // No increments lost, and the counter stops at the threshold: the
        // three attempts arriving after the lock leave the record unchanged.
        assert!(locked_transitions >= 1);
        let record = store.find_by_id(cred.id).await.unwrap().unwrap();
        assert_eq!(record.failed_attempts, 5);
        assert_eq!(record.locked_until, Some(lock_until));
    }

    #[tokio::test]
    async fn test_attempt_during_active_lock_leaves_record_unchanged() {
        let store = MemoryCredentialStore::new();
        let cred = store.create(&new_credential("a@b.com")).await.unwrap();
        let until = Utc::now() + Duration::hours(1);

        store
            .update_with(cred.id, |c| {
                c.failed_attempts = 5;
                c.locked_until = Some(until);
            })
            .await
            .unwrap();

        let snap = store
            .record_failed_attempt(cred.id, 5, Utc::now() + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(snap.failed_attempts, 5);
        assert_eq!(snap.locked_until, Some(until));
    }

    #[tokio::test]
    async fn test_update_password_clears_lock_and_reset() {
        let store = MemoryCredentialStore::new();
        let cred = store.create(&new_credential("a@b.com")).await.unwrap();

        store
            .set_reset_token(cred.id, "digest", Utc::now() + Duration::hours(1))
            .await
            .unwrap();
        store
            .record_failed_attempt(cred.id, 1, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        store.update_password(cred.id, "$argon2id$new").await.unwrap();

        let record = store.find_by_id(cred.id).await.unwrap().unwrap();
        assert_eq!(record.password_hash, "$argon2id$new");
        assert_eq!(record.failed_attempts, 0);
        assert!(record.locked_until.is_none());
        assert!(record.reset_digest.is_none());
        assert!(record.reset_expires_at.is_none());
    }

    #[tokio::test]
    async fn test_totp_lifecycle() {
        let store = MemoryCredentialStore::new();
        let cred = store.create(&new_credential("a@b.com")).await.unwrap();

        assert!(store.enable_totp(cred.id).await.is_err());

        store
            .set_pending_totp_secret(cred.id, "JBSWY3DPEHPK3PXP")
            .await
            .unwrap();
        store.enable_totp(cred.id).await.unwrap();

        let record = store.find_by_id(cred.id).await.unwrap().unwrap();
        assert!(record.totp_enabled);

        store.disable_totp(cred.id).await.unwrap();
        let record = store.find_by_id(cred.id).await.unwrap().unwrap();
        assert!(!record.totp_enabled);
        assert!(record.totp_secret.is_none());
    }

    #[tokio::test]
    async fn test_mark_verified_clears_token_fields_together() {
        let store = MemoryCredentialStore::new();
        let cred = store.create(&new_credential("a@b.com")).await.unwrap();

        store
            .set_verification_token(cred.id, "digest", Utc::now() + Duration::hours(24))
            .await
            .unwrap();
        let record = store
            .find_by_verification_digest("digest")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.id, cred.id);

        store.mark_verified(cred.id).await.unwrap();
        let record = store.find_by_id(cred.id).await.unwrap().unwrap();
        assert!(record.verified);
        assert!(record.verification_digest.is_none());
        assert!(record.verification_expires_at.is_none());
    }
}
