//! Bearer token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use keygate_core::config::token::TokenConfig;
use keygate_core::{AuthError, AuthResult};

use super::claims::{Claims, TokenType};

/// Validates signed bearer tokens.
///
/// Verification is stateless: signature and expiry only, no server-side
/// revocation list. Logout is a client-side token discard.
#[derive(Clone)]
pub struct TokenVerifier {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    /// Creates a new verifier from token configuration.
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates a full session token.
    ///
    /// A pre-authentication token is rejected here with `TokenInvalid`:
    /// only the TOTP login-verification step accepts that kind.
    pub fn verify_session(&self, token: &str) -> AuthResult<Claims> {
        let claims = self.decode(token)?;

        if claims.token_type != TokenType::Session {
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }

    /// Decodes and validates a pre-authentication token.
    pub fn verify_pre_auth(&self, token: &str) -> AuthResult<Claims> {
        let claims = self.decode(token)?;

        if claims.token_type != TokenType::PreAuth {
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }

    /// Internal decode without kind checking.
    fn decode(&self, token: &str) -> AuthResult<Claims> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::TokenInvalid,
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::TokenIssuer;
    use chrono::Utc;
    use keygate_entity::{Credential, CredentialRole};
    use uuid::Uuid;

    fn config() -> TokenConfig {
        TokenConfig {
            jwt_secret: "test-secret".to_string(),
            ..TokenConfig::default()
        }
    }

    fn credential() -> Credential {
        let now = Utc::now();
        Credential {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: CredentialRole::User,
            verified: true,
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
    fn test_session_round_trip() {
        let cred = credential();
        let issuer = TokenIssuer::new(&config());
        let verifier = TokenVerifier::new(&config());

        let bearer = issuer.issue_session(&cred).unwrap();
        let claims = verifier.verify_session(&bearer.token).unwrap();

        assert_eq!(claims.sub, cred.id);
        assert_eq!(claims.email, cred.email);
        assert_eq!(claims.role, CredentialRole::User);
        assert_eq!(claims.token_type, TokenType::Session);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_pre_auth_rejected_as_session() {
        let cred = credential();
        let issuer = TokenIssuer::new(&config());
        let verifier = TokenVerifier::new(&config());

        let bearer = issuer.issue_pre_auth(&cred).unwrap();
        assert!(matches!(
            verifier.verify_session(&bearer.token),
            Err(AuthError::TokenInvalid)
        ));
        // But the pre-auth entry point accepts it.
        assert!(verifier.verify_pre_auth(&bearer.token).is_ok());
    }

    #[test]
    fn test_session_rejected_as_pre_auth() {
        let cred = credential();
        let issuer = TokenIssuer::new(&config());
        let verifier = TokenVerifier::new(&config());

        let bearer = issuer.issue_session(&cred).unwrap();
        assert!(matches!(
            verifier.verify_pre_auth(&bearer.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let cred = credential();
        let issuer = TokenIssuer::new(&config());
        let other = TokenConfig {
            jwt_secret: "other-secret".to_string(),
            ..TokenConfig::default()
        };
        let verifier = TokenVerifier::new(&other);

        let bearer = issuer.issue_session(&cred).unwrap();
        assert!(matches!(
            verifier.verify_session(&bearer.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_expired_token() {
        use crate::jwt::claims::Claims;
        use jsonwebtoken::{EncodingKey, Header, encode};

        let cred = credential();
        let now = Utc::now();
        let claims = Claims {
            sub: cred.id,
            email: cred.email.clone(),
            role: cred.role,
            iat: now.timestamp() - 3600,
            exp: now.timestamp() - 60, // past the 5s leeway
            jti: Uuid::new_v4(),
            token_type: TokenType::Session,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config().jwt_secret.as_bytes()),
        )
        .unwrap();

        let verifier = TokenVerifier::new(&config());
        assert!(matches!(
            verifier.verify_session(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = TokenVerifier::new(&config());
        assert!(matches!(
            verifier.verify_session("not.a.jwt"),
            Err(AuthError::TokenInvalid)
        ));
    }
}
