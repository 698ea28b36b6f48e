//! Time-based one-time password enrollment and code verification.

use totp_rs::{Algorithm, Secret, TOTP};

use keygate_core::config::totp::TotpConfig;
use keygate_core::{AuthError, AuthResult};

/// Material handed to the user when enrollment begins.
#[derive(Debug, Clone)]
pub struct TotpEnrollment {
    /// Base32 shared secret for manual entry. Persisted on the record as
    /// the pending secret; never returned to clients after confirmation.
    pub secret: String,
    /// `otpauth://` provisioning URL for QR rendering.
    pub otpauth_url: String,
}

/// Generates enrollment secrets and verifies step-based one-time codes.
#[derive(Debug, Clone)]
pub struct TotpManager {
    /// Issuer name embedded in provisioning URLs.
    issuer: String,
    /// Digits per code.
    digits: usize,
    /// Time step in seconds.
    step_seconds: u64,
    /// Accepted drift in steps on either side.
    skew: u8,
}

impl TotpManager {
    /// Creates a manager from TOTP configuration.
    pub fn new(config: &TotpConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            digits: config.digits,
            step_seconds: config.step_seconds,
            skew: config.skew,
        }
    }

    /// Generates a fresh shared secret and provisioning descriptor for the
    /// given account label. Nothing is persisted here; the caller stores
    /// the secret as pending on the credential record.
    pub fn generate_enrollment(&self, account: &str) -> AuthResult<TotpEnrollment> {
        let secret = Secret::generate_secret();
        let secret_bytes = secret
            .to_bytes()
            .map_err(|e| AuthError::internal(format!("TOTP secret generation failed: {e:?}")))?;

        let totp = self.build(secret_bytes, account)?;

        Ok(TotpEnrollment {
            secret: totp.get_secret_base32(),
            otpauth_url: totp.get_url(),
        })
    }

    /// Verifies a submitted code against a stored base32 secret at the
    /// current time step, within the configured drift tolerance.
    ///
    /// A code of the wrong shape is a validation failure, not a TOTP
    /// failure; shape is checked before any TOTP math.
    pub fn verify_code(&self, secret_base32: &str, account: &str, code: &str) -> AuthResult<bool> {
        if !self.code_shape_ok(code) {
            return Err(AuthError::validation(
                "code",
                format!("Code must be exactly {} digits", self.digits),
            ));
        }

        let secret_bytes = Secret::Encoded(secret_base32.to_string())
            .to_bytes()
            .map_err(|e| AuthError::internal(format!("Stored TOTP secret is invalid: {e:?}")))?;

        let totp = self.build(secret_bytes, account)?;

        totp.check_current(code)
            .map_err(|e| AuthError::internal(format!("System clock error: {e}")))
    }

    /// Whether a submitted code has the expected all-digit shape.
    pub fn code_shape_ok(&self, code: &str) -> bool {
        code.len() == self.digits && code.bytes().all(|b| b.is_ascii_digit())
    }

    fn build(&self, secret: Vec<u8>, account: &str) -> AuthResult<TOTP> {
        TOTP::new(
            Algorithm::SHA1,
            self.digits,
            self.skew,
            self.step_seconds,
            secret,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| AuthError::internal(format!("TOTP initialization failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> TotpManager {
        TotpManager::new(&TotpConfig::default())
    }

    /// Computes the current valid code for a base32 secret, the way an
    /// authenticator app would.
    fn current_code(secret_base32: &str) -> String {
        let totp = TOTP::new(
            Algorithm::SHA1,
            6,
            1,
            30,
            Secret::Encoded(secret_base32.to_string()).to_bytes().unwrap(),
            Some("Keygate".to_string()),
            "a@b.com".to_string(),
        )
        .unwrap();
        totp.generate_current().unwrap()
    }

    #[test]
    fn test_enrollment_descriptor() {
        let enrollment = manager().generate_enrollment("a@b.com").unwrap();
        assert!(!enrollment.secret.is_empty());
        assert!(enrollment.otpauth_url.starts_with("otpauth://totp/"));
        assert!(enrollment.otpauth_url.contains("Keygate"));
    }

    #[test]
    fn test_enrollment_secrets_are_unique() {
        let m = manager();
        let a = m.generate_enrollment("a@b.com").unwrap();
        let b = m.generate_enrollment("a@b.com").unwrap();
        assert_ne!(a.secret, b.secret);
    }

    #[test]
    fn test_correct_code_verifies() {
        let m = manager();
        let enrollment = m.generate_enrollment("a@b.com").unwrap();
        let code = current_code(&enrollment.secret);
        assert!(m.verify_code(&enrollment.secret, "a@b.com", &code).unwrap());
    }

    #[test]
    fn test_code_from_wrong_secret_fails() {
        let m = manager();
        let enrolled = m.generate_enrollment("a@b.com").unwrap();
        let other = m.generate_enrollment("a@b.com").unwrap();
        let code = current_code(&other.secret);
        // Same-step collision across independent secrets is a 1-in-10^6 event;
        // tolerate it rather than flake.
        if code != current_code(&enrolled.secret) {
            assert!(!m.verify_code(&enrolled.secret, "a@b.com", &code).unwrap());
        }
    }

    #[test]
    fn test_malformed_code_is_validation_error() {
        let m = manager();
        let enrollment = m.generate_enrollment("a@b.com").unwrap();
        for bad in ["", "12345", "1234567", "12345a", "abcdef"] {
            assert!(matches!(
                m.verify_code(&enrollment.secret, "a@b.com", bad),
                Err(AuthError::Validation { .. })
            ));
        }
    }

    #[test]
    fn test_code_shape() {
        let m = manager();
        assert!(m.code_shape_ok("000000"));
        assert!(!m.code_shape_ok("00000"));
        assert!(!m.code_shape_ok("00000x"));
        assert!(!m.code_shape_ok("½23456"));
    }
}
