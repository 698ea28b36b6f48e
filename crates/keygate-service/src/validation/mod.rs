//! Request validation: typed input structs and an aggregating entry point.
//!
//! Every orchestrator operation takes one of the input structs defined in
//! [`inputs`]. [`validate`] runs all declared rules and collects **every**
//! violation into a field-to-message map, so a caller fixing a form sees all
//! problems at once rather than one per round trip.

pub mod inputs;
pub mod rules;

use std::collections::BTreeMap;

use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use keygate_core::{AuthError, AuthResult};

pub use inputs::{
    ChangePasswordInput, ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput,
    TotpCodeInput, TotpLoginInput, VerifyEmailInput,
};

/// Runs all declared rules on an input, aggregating every violation.
pub fn validate<T: Validate>(input: &T) -> AuthResult<()> {
    input.validate().map_err(into_validation_error)
}

fn into_validation_error(errors: ValidationErrors) -> AuthError {
    let mut fields = BTreeMap::new();

    for (field, kind) in errors.into_errors() {
        if let ValidationErrorsKind::Field(violations) = kind {
            for v in violations {
                // Struct-level rules land under "__all__"; their code names
                // the field they concern.
                let key = if field == "__all__" {
                    v.code.to_string()
                } else {
                    field.to_string()
                };
                let message = v
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {key}"));

                fields
                    .entry(key)
                    .and_modify(|existing: &mut String| {
                        existing.push_str("; ");
                        existing.push_str(&message);
                    })
                    .or_insert(message);
            }
        }
    }

    AuthError::Validation { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_input() -> RegisterInput {
        RegisterInput {
            email: "a@b.com".to_string(),
            password: "Abcd123!".to_string(),
            confirm_password: "Abcd123!".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            terms_accepted: true,
        }
    }

    fn fields_of(err: AuthError) -> BTreeMap<String, String> {
        match err {
            AuthError::Validation { fields } => fields,
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_register_input_passes() {
        assert!(validate(&register_input()).is_ok());
    }

    #[test]
    fn test_all_violations_are_aggregated() {
        let input = RegisterInput {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            confirm_password: "different".to_string(),
            first_name: String::new(),
            last_name: "Lovelace".to_string(),
            terms_accepted: false,
        };

        let fields = fields_of(validate(&input).unwrap_err());
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("confirm_password"));
        assert!(fields.contains_key("first_name"));
        assert!(fields.contains_key("terms_accepted"));
        assert!(!fields.contains_key("last_name"));
    }

    #[test]
    fn test_password_complexity_classes() {
        for bad in ["abcdefgh1!", "ABCDEFGH1!", "Abcdefgh!", "Abcdefgh1"] {
            let input = RegisterInput {
                password: bad.to_string(),
                confirm_password: bad.to_string(),
                ..register_input()
            };
            let fields = fields_of(validate(&input).unwrap_err());
            assert!(fields.contains_key("password"), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_confirm_password_must_match() {
        let input = RegisterInput {
            confirm_password: "Abcd123?".to_string(),
            ..register_input()
        };
        let fields = fields_of(validate(&input).unwrap_err());
        assert!(fields.contains_key("confirm_password"));
    }

    #[test]
    fn test_totp_code_shape() {
        assert!(validate(&TotpCodeInput {
            code: "123456".to_string()
        })
        .is_ok());

        for bad in ["", "12345", "1234567", "12345a"] {
            let fields = fields_of(
                validate(&TotpCodeInput {
                    code: bad.to_string(),
                })
                .unwrap_err(),
            );
            assert!(fields.contains_key("code"), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_change_password_must_differ() {
        let input = ChangePasswordInput {
            current_password: "Abcd123!".to_string(),
            new_password: "Abcd123!".to_string(),
            confirm_password: "Abcd123!".to_string(),
        };
        let fields = fields_of(validate(&input).unwrap_err());
        assert!(fields.contains_key("new_password"));
    }

    #[test]
    fn test_login_input_requires_password() {
        let input = LoginInput {
            email: "a@b.com".to_string(),
            password: String::new(),
        };
        let fields = fields_of(validate(&input).unwrap_err());
        assert!(fields.contains_key("password"));
    }
}
