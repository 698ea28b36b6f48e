//! PostgreSQL credential store implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use keygate_core::{AuthError, AuthResult};
use keygate_entity::{Credential, NewCredential};

use super::{CredentialStore, LockoutSnapshot};

/// Credential store over a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AuthError {
    move |e| AuthError::store_unavailable(context, e)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Credential>> {
        sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("Failed to find credential by id"))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Credential>> {
        sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("Failed to find credential by email"))
    }

    async fn find_by_verification_digest(&self, digest: &str) -> AuthResult<Option<Credential>> {
        sqlx::query_as::<_, Credential>(
            "SELECT * FROM credentials WHERE verification_digest = $1",
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err("Failed to find credential by verification digest"))
    }

    async fn find_by_reset_digest(&self, digest: &str) -> AuthResult<Option<Credential>> {
        sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE reset_digest = $1")
            .bind(digest)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err("Failed to find credential by reset digest"))
    }

    async fn create(&self, data: &NewCredential) -> AuthResult<Credential> {
        sqlx::query_as::<_, Credential>(
            "INSERT INTO credentials (email, first_name, last_name, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(&data.email)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.password_hash)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("credentials_email_key") =>
            {
                AuthError::EmailAlreadyExists
            }
            _ => AuthError::store_unavailable("Failed to create credential", e),
        })
    }

    async fn record_failed_attempt(
        &self,
        id: Uuid,
        threshold: i32,
        lock_until: DateTime<Utc>,
    ) -> AuthResult<LockoutSnapshot> {
        // One conditional UPDATE: all SET expressions read the pre-update row,
        // so the increment-and-maybe-lock transition cannot race another
        // attempt. An attempt racing past the guard while a lock is active
        // leaves the row unchanged; an elapsed lock restarts the counter at 1.
        let row: (i32, Option<DateTime<Utc>>) = sqlx::query_as(
            "UPDATE credentials SET \
                 failed_attempts = CASE \
                     WHEN locked_until IS NOT NULL AND locked_until > NOW() THEN failed_attempts \
                     WHEN locked_until IS NOT NULL THEN 1 \
                     ELSE failed_attempts + 1 END, \
                 locked_until = CASE \
                     WHEN locked_until IS NOT NULL AND locked_until > NOW() THEN locked_until \
                     WHEN locked_until IS NOT NULL THEN \
                         CASE WHEN 1 >= $2 THEN $3 ELSE NULL END \
                     WHEN failed_attempts + 1 >= $2 THEN $3 \
                     ELSE locked_until END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING failed_attempts, locked_until",
        )
        .bind(id)
        .bind(threshold)
        .bind(lock_until)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err("Failed to record failed attempt"))?;

        Ok(LockoutSnapshot {
            failed_attempts: row.0,
            locked_until: row.1,
        })
    }

    async fn clear_lockout(&self, id: Uuid) -> AuthResult<()> {
        execute_on(
            &self.pool,
            "UPDATE credentials SET failed_attempts = 0, locked_until = NULL, updated_at = NOW() \
             WHERE id = $1",
            id,
            "Failed to clear lockout",
        )
        .await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE credentials SET password_hash = $2, \
                 failed_attempts = 0, locked_until = NULL, \
                 reset_digest = NULL, reset_expires_at = NULL, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(store_err("Failed to update password"))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::internal(format!("Credential {id} not found")));
        }
        Ok(())
    }

    async fn set_verification_token(
        &self,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE credentials SET verification_digest = $2, verification_expires_at = $3, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(digest)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err("Failed to set verification token"))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::internal(format!("Credential {id} not found")));
        }
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> AuthResult<()> {
        execute_on(
            &self.pool,
            "UPDATE credentials SET verified = TRUE, \
                 verification_digest = NULL, verification_expires_at = NULL, \
                 updated_at = NOW() \
             WHERE id = $1",
            id,
            "Failed to mark verified",
        )
        .await
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        digest: &str,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE credentials SET reset_digest = $2, reset_expires_at = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(digest)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(store_err("Failed to set reset token"))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::internal(format!("Credential {id} not found")));
        }
        Ok(())
    }

    async fn set_pending_totp_secret(&self, id: Uuid, secret: &str) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE credentials SET totp_secret = $2, totp_enabled = FALSE, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(secret)
        .execute(&self.pool)
        .await
        .map_err(store_err("Failed to store pending TOTP secret"))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::internal(format!("Credential {id} not found")));
        }
        Ok(())
    }

    async fn enable_totp(&self, id: Uuid) -> AuthResult<()> {
        execute_on(
            &self.pool,
            "UPDATE credentials SET totp_enabled = TRUE, updated_at = NOW() \
             WHERE id = $1 AND totp_secret IS NOT NULL",
            id,
            "Failed to enable TOTP",
        )
        .await
    }

    async fn disable_totp(&self, id: Uuid) -> AuthResult<()> {
        execute_on(
            &self.pool,
            "UPDATE credentials SET totp_enabled = FALSE, totp_secret = NULL, updated_at = NOW() \
             WHERE id = $1",
            id,
            "Failed to disable TOTP",
        )
        .await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE credentials SET active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(store_err("Failed to set active flag"))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::internal(format!("Credential {id} not found")));
        }
        Ok(())
    }
}

/// Run a single-row UPDATE keyed by id, mapping zero affected rows to an
/// internal error.
async fn execute_on(
    pool: &PgPool,
    sql: &'static str,
    id: Uuid,
    context: &'static str,
) -> AuthResult<()> {
    let result = sqlx::query(sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(store_err(context))?;

    if result.rows_affected() == 0 {
        return Err(AuthError::internal(format!("Credential {id} not found")));
    }
    Ok(())
}
