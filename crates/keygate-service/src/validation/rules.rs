//! Custom validation rules shared across the input structs.

use std::borrow::Cow;

use validator::ValidationError;

use super::inputs::ChangePasswordInput;

/// Digits per one-time code.
const TOTP_CODE_DIGITS: usize = 6;

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Passwords must contain an upper-case letter, a lower-case letter, a
/// digit, and a symbol. Length is enforced separately.
pub fn password_complexity(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        Err(violation(
            "password_complexity",
            "Password must contain an upper-case letter, a lower-case letter, a digit, and a symbol",
        ))
    }
}

/// Registration requires explicit terms acceptance.
pub fn terms_accepted(accepted: &bool) -> Result<(), ValidationError> {
    if *accepted {
        Ok(())
    } else {
        Err(violation(
            "terms_accepted",
            "The terms of service must be accepted",
        ))
    }
}

/// One-time codes are exactly six ASCII digits; anything else is a
/// validation failure rather than a code-verification failure.
pub fn totp_code_shape(code: &str) -> Result<(), ValidationError> {
    if code.len() == TOTP_CODE_DIGITS && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(violation(
            "totp_code_shape",
            "Code must be exactly 6 digits",
        ))
    }
}

/// A changed password must actually change.
pub fn new_password_differs(input: &ChangePasswordInput) -> Result<(), ValidationError> {
    if input.new_password == input.current_password {
        Err(violation(
            "new_password",
            "New password must differ from the current password",
        ))
    } else {
        Ok(())
    }
}
