//! Random one-time tokens with one-way stored digests.
//!
//! Both the email-verification and password-reset flows hand the raw token
//! to the user out-of-band and persist only its SHA-256 digest, so a leak
//! of the durable store exposes no usable tokens.

use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Number of random bytes per token (256 bits of entropy).
const TOKEN_BYTES: usize = 32;

/// A freshly issued single-use token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The raw token, hex-encoded. Sent to the user, never persisted.
    pub raw: String,
    /// The SHA-256 digest of the raw token, hex-encoded. The only form
    /// that may be persisted.
    pub digest: String,
    /// When the token was generated.
    pub issued_at: DateTime<Utc>,
}

/// Generator and matcher for single-use tokens.
pub struct OneTimeToken;

impl OneTimeToken {
    /// Generates a cryptographically random token and its stored digest.
    pub fn issue() -> IssuedToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        let digest = Self::digest(&raw);

        IssuedToken {
            raw,
            digest,
            issued_at: Utc::now(),
        }
    }

    /// Computes the hex-encoded SHA-256 digest of a raw token.
    pub fn digest(raw: &str) -> String {
        hex::encode(Sha256::digest(raw.as_bytes()))
    }

    /// Recomputes the digest of a presented raw token and compares it
    /// against the stored digest in constant time.
    pub fn matches(raw: &str, stored_digest: &str) -> bool {
        let computed = Self::digest(raw);
        computed
            .as_bytes()
            .ct_eq(stored_digest.as_bytes())
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_round_trip() {
        let token = OneTimeToken::issue();
        assert_eq!(token.raw.len(), TOKEN_BYTES * 2);
        assert_ne!(token.raw, token.digest);
        assert!(OneTimeToken::matches(&token.raw, &token.digest));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = OneTimeToken::issue();
        let b = OneTimeToken::issue();
        assert_ne!(a.raw, b.raw);
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn test_bit_flip_rejected() {
        let token = OneTimeToken::issue();
        let mut tampered = token.raw.clone().into_bytes();
        // Flip one hex character.
        tampered[0] = if tampered[0] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert!(!OneTimeToken::matches(&tampered, &token.digest));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let token = OneTimeToken::issue();
        assert!(!OneTimeToken::matches("", &token.digest));
        assert!(!OneTimeToken::matches(&token.raw, "deadbeef"));
    }
}
