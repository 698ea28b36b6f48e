//! Sequencing of the authentication use cases.
//!
//! `AuthService` is the single entry point for calling collaborators. Each
//! method validates its input, loads the credential record, applies the
//! cryptographic primitives in the required order, and persists the
//! resulting transition through the store. Raw one-time tokens are returned
//! to the caller for out-of-band delivery; only their digests persist.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use keygate_auth::{
    IssuedBearer, LockoutPolicy, OneTimeToken, PasswordHasher, TokenIssuer, TokenVerifier,
    TotpEnrollment, TotpManager,
};
use keygate_core::config::auth::AuthConfig;
use keygate_core::config::token::TokenConfig;
use keygate_core::config::totp::TotpConfig;
use keygate_core::{AuthError, AuthResult};
use keygate_database::CredentialStore;
use keygate_entity::{Credential, CredentialRole, Identity, NewCredential, TotpState};

use crate::validation::{
    self, ChangePasswordInput, ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput,
    TotpCodeInput, TotpLoginInput, VerifyEmailInput,
};

/// Result of a successful registration.
///
/// The raw verification token is handed to the email-delivery collaborator;
/// it is never persisted and never appears again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Identifier of the created account.
    pub credential_id: Uuid,
    /// Raw email-verification token for out-of-band delivery.
    pub verification_token: String,
    /// When the verification token expires.
    pub verification_expires_at: DateTime<Utc>,
}

/// Outcome of a password login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoginOutcome {
    /// Password sufficed; a full session token was issued.
    Session(IssuedBearer),
    /// Password verified but a second factor is required; the pre-auth
    /// token is only accepted by [`AuthService::verify_totp_login`].
    TwoFactorRequired {
        /// Short-lived pre-authentication token.
        pre_auth: IssuedBearer,
    },
}

/// A freshly issued password-reset token for out-of-band delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedReset {
    /// Raw reset token.
    pub reset_token: String,
    /// When the reset token expires.
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates registration, login, token, and second-factor use cases.
pub struct AuthService {
    /// Durable credential store.
    store: Arc<dyn CredentialStore>,
    /// Argon2id hasher.
    hasher: PasswordHasher,
    /// Bearer token mint.
    issuer: TokenIssuer,
    /// Bearer token validator.
    verifier: TokenVerifier,
    /// Second-factor enrollment and code checks.
    totp: TotpManager,
    /// Failed-attempt threshold and lock window.
    lockout: LockoutPolicy,
    /// Email-verification token lifetime.
    verification_ttl: Duration,
    /// Password-reset token lifetime.
    reset_ttl: Duration,
}

impl AuthService {
    /// Creates the service from its store and configuration sections.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        auth_config: &AuthConfig,
        token_config: &TokenConfig,
        totp_config: &TotpConfig,
    ) -> AuthResult<Self> {
        Ok(Self {
            store,
            hasher: PasswordHasher::new(auth_config)?,
            issuer: TokenIssuer::new(token_config),
            verifier: TokenVerifier::new(token_config),
            totp: TotpManager::new(totp_config),
            lockout: LockoutPolicy::new(auth_config),
            verification_ttl: Duration::hours(token_config.verification_ttl_hours as i64),
            reset_ttl: Duration::minutes(token_config.reset_ttl_minutes as i64),
        })
    }

    /// Registers a new account and issues its email-verification token.
    ///
    /// The account can log in immediately; verification is not a login
    /// precondition, only a precondition for second-factor management.
    pub async fn register(&self, input: RegisterInput) -> AuthResult<Registration> {
        validation::validate(&input)?;

        let email = normalize_email(&input.email);
        let password_hash = self.hasher.hash_password(&input.password)?;

        let credential = self
            .store
            .create(&NewCredential {
                email,
                first_name: input.first_name.trim().to_string(),
                last_name: input.last_name.trim().to_string(),
                password_hash,
                role: CredentialRole::default(),
            })
            .await?;

        let token = OneTimeToken::issue();
        let expires_at = token.issued_at + self.verification_ttl;
        self.store
            .set_verification_token(credential.id, &token.digest, expires_at)
            .await?;

        info!(credential_id = %credential.id, "Account registered");

        Ok(Registration {
            credential_id: credential.id,
            verification_token: token.raw,
            verification_expires_at: expires_at,
        })
    }

    /// Authenticates by email and password.
    ///
    /// The lockout check runs before any hash work; a wrong password goes
    /// through the atomic failed-attempt transition. When the second factor
    /// is enabled, password success yields a restricted pre-auth token
    /// instead of a session.
    pub async fn login(&self, input: LoginInput) -> AuthResult<LoginOutcome> {
        validation::validate(&input)?;

        let email = normalize_email(&input.email);
        let Some(credential) = self.store.find_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !credential.active {
            return Err(AuthError::AccountDisabled);
        }

        let now = Utc::now();
        self.lockout.check(&credential, now)?;

        if !self.hasher.verify_password(&input.password, &credential.password_hash) {
            let snapshot = self
                .store
                .record_failed_attempt(credential.id, self.lockout.max_failed_attempts(), self.lockout.lock_candidate(now))
                .await?;

            if snapshot.is_locked(now) {
                warn!(
                    credential_id = %credential.id,
                    failed_attempts = snapshot.failed_attempts,
                    "Account locked after repeated failed logins"
                );
            }
            return Err(AuthError::InvalidCredentials);
        }

        // Password success resets the counter in both branches.
        if credential.failed_attempts > 0 || credential.locked_until.is_some() {
            self.store.clear_lockout(credential.id).await?;
        }

        if credential.totp_enabled {
            let pre_auth = self.issuer.issue_pre_auth(&credential)?;
            info!(credential_id = %credential.id, "Password verified, second factor pending");
            return Ok(LoginOutcome::TwoFactorRequired { pre_auth });
        }

        let session = self.issuer.issue_session(&credential)?;
        info!(credential_id = %credential.id, "Login succeeded");
        Ok(LoginOutcome::Session(session))
    }

    /// Completes a two-factor login by upgrading a pre-auth token.
    ///
    /// A failed code leaves the pre-auth token usable until its own expiry
    /// and never touches the failed-attempt counter.
    pub async fn verify_totp_login(&self, input: TotpLoginInput) -> AuthResult<IssuedBearer> {
        validation::validate(&input)?;

        let claims = self.verifier.verify_pre_auth(&input.pre_auth_token)?;
        let credential = self.require_credential(claims.credential_id()).await?;

        if !credential.active {
            return Err(AuthError::AccountDisabled);
        }

        // Second factor may have been disabled after the pre-auth token
        // was minted.
        if credential.totp_state() != TotpState::Enabled {
            return Err(AuthError::TokenInvalid);
        }
        let Some(secret) = credential.totp_secret.as_deref() else {
            return Err(AuthError::TokenInvalid);
        };

        if !self.totp.verify_code(secret, &credential.email, &input.code)? {
            return Err(AuthError::InvalidTotpCode);
        }

        let session = self.issuer.issue_session(&credential)?;
        info!(credential_id = %credential.id, "Second factor verified, login succeeded");
        Ok(session)
    }

    /// Consumes an email-verification token.
    ///
    /// A wrong token and an expired token are indistinguishable to the
    /// caller.
    pub async fn verify_email(&self, input: VerifyEmailInput) -> AuthResult<()> {
        validation::validate(&input)?;

        let digest = OneTimeToken::digest(&input.token);
        let Some(credential) = self.store.find_by_verification_digest(&digest).await? else {
            return Err(AuthError::InvalidOrExpiredToken);
        };

        let now = Utc::now();
        let live = credential.has_live_verification_token(now)
            && credential
                .verification_digest
                .as_deref()
                .is_some_and(|stored| OneTimeToken::matches(&input.token, stored));
        if !live {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        self.store.mark_verified(credential.id).await?;
        info!(credential_id = %credential.id, "Email verified");
        Ok(())
    }

    /// Starts a password reset.
    ///
    /// Returns `Ok(None)` when no active account matches, so the caller's
    /// response is identical either way and accounts cannot be enumerated.
    /// A new token supersedes any outstanding one.
    pub async fn forgot_password(
        &self,
        input: ForgotPasswordInput,
    ) -> AuthResult<Option<IssuedReset>> {
        validation::validate(&input)?;

        let email = normalize_email(&input.email);
        let Some(credential) = self.store.find_by_email(&email).await? else {
            return Ok(None);
        };
        if !credential.active {
            return Ok(None);
        }

        let token = OneTimeToken::issue();
        let expires_at = token.issued_at + self.reset_ttl;
        self.store
            .set_reset_token(credential.id, &token.digest, expires_at)
            .await?;

        info!(credential_id = %credential.id, "Password reset token issued");

        Ok(Some(IssuedReset {
            reset_token: token.raw,
            expires_at,
        }))
    }

    /// Consumes a reset token and replaces the password.
    ///
    /// A successful reset always clears the failed-attempt counter and any
    /// lock, and invalidates the old password immediately.
    pub async fn reset_password(&self, input: ResetPasswordInput) -> AuthResult<()> {
        validation::validate(&input)?;

        let digest = OneTimeToken::digest(&input.token);
        let Some(credential) = self.store.find_by_reset_digest(&digest).await? else {
            return Err(AuthError::InvalidOrExpiredToken);
        };

        let now = Utc::now();
        let live = credential.has_live_reset_token(now)
            && credential
                .reset_digest
                .as_deref()
                .is_some_and(|stored| OneTimeToken::matches(&input.token, stored));
        if !live {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let password_hash = self.hasher.hash_password(&input.new_password)?;
        self.store
            .update_password(credential.id, &password_hash)
            .await?;

        info!(credential_id = %credential.id, "Password reset");
        Ok(())
    }

    /// Changes the password of an authenticated account.
    pub async fn change_password(
        &self,
        session_token: &str,
        input: ChangePasswordInput,
    ) -> AuthResult<()> {
        validation::validate(&input)?;

        let claims = self.verifier.verify_session(session_token)?;
        let credential = self.require_credential(claims.credential_id()).await?;

        if !credential.active {
            return Err(AuthError::AccountDisabled);
        }

        if !self
            .hasher
            .verify_password(&input.current_password, &credential.password_hash)
        {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hasher.hash_password(&input.new_password)?;
        self.store
            .update_password(credential.id, &password_hash)
            .await?;

        info!(credential_id = %credential.id, "Password changed");
        Ok(())
    }

    /// Begins second-factor enrollment for a verified account.
    ///
    /// Calling again before confirmation overwrites the pending secret.
    /// An already-enabled second factor must be disabled explicitly first;
    /// overwriting it here would drop the factor before any replacement
    /// code is confirmed.
    pub async fn setup_totp(&self, session_token: &str) -> AuthResult<TotpEnrollment> {
        let credential = self.require_verified(session_token).await?;

        if credential.totp_state() == TotpState::Enabled {
            return Err(AuthError::forbidden(
                "Two-factor authentication is already enabled; disable it before re-enrolling",
            ));
        }

        let enrollment = self.totp.generate_enrollment(&credential.email)?;
        self.store
            .set_pending_totp_secret(credential.id, &enrollment.secret)
            .await?;

        info!(credential_id = %credential.id, "TOTP enrollment started");
        Ok(enrollment)
    }

    /// Confirms second-factor enrollment with a code from the pending
    /// secret. On failure the pending state is unchanged and the caller may
    /// retry or re-begin enrollment.
    pub async fn confirm_totp(&self, session_token: &str, input: TotpCodeInput) -> AuthResult<()> {
        validation::validate(&input)?;
        let credential = self.require_verified(session_token).await?;

        let Some(secret) = credential.totp_secret.as_deref() else {
            return Err(AuthError::forbidden("TOTP enrollment has not been started"));
        };

        if !self.totp.verify_code(secret, &credential.email, &input.code)? {
            return Err(AuthError::InvalidTotpCode);
        }

        self.store.enable_totp(credential.id).await?;
        info!(credential_id = %credential.id, "TOTP enabled");
        Ok(())
    }

    /// Disables the second factor, clearing the secret.
    pub async fn disable_totp(&self, session_token: &str) -> AuthResult<()> {
        let credential = self.require_verified(session_token).await?;

        self.store.disable_totp(credential.id).await?;
        info!(credential_id = %credential.id, "TOTP disabled");
        Ok(())
    }

    /// Returns the client-safe identity for a full session token.
    ///
    /// Pre-auth tokens are rejected here like everywhere outside the TOTP
    /// login step.
    pub async fn current_identity(&self, session_token: &str) -> AuthResult<Identity> {
        let claims = self.verifier.verify_session(session_token)?;
        let credential = self.require_credential(claims.credential_id()).await?;

        if !credential.active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(credential.identity())
    }

    /// Loads the credential a token points at; a missing record means the
    /// token no longer corresponds to an account.
    async fn require_credential(&self, id: Uuid) -> AuthResult<Credential> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AuthError::TokenInvalid)
    }

    /// Session-token authentication plus the verified-email precondition
    /// shared by the second-factor management operations.
    async fn require_verified(&self, session_token: &str) -> AuthResult<Credential> {
        let claims = self.verifier.verify_session(session_token)?;
        let credential = self.require_credential(claims.credential_id()).await?;

        if !credential.active {
            return Err(AuthError::AccountDisabled);
        }
        if !credential.verified {
            return Err(AuthError::forbidden(
                "Email verification is required before managing two-factor authentication",
            ));
        }
        Ok(credential)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("lockout", &self.lockout)
            .field("verification_ttl", &self.verification_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish()
    }
}

/// Emails are stored trimmed and lower-cased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
    }
}
