//! Typed inputs for each orchestrator operation, with declared rules.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::rules;

/// Registration input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterInput {
    /// Account email.
    #[validate(
        email(message = "A valid email address is required"),
        length(max = 254, message = "Email must be at most 254 characters")
    )]
    pub email: String,
    /// Plaintext password.
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = rules::password_complexity)
    )]
    pub password: String,
    /// Password confirmation.
    #[validate(must_match(other = password, message = "Passwords do not match"))]
    pub confirm_password: String,
    /// Given name.
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    /// Terms-of-service acceptance.
    #[validate(custom(function = rules::terms_accepted))]
    pub terms_accepted: bool,
}

/// Password login input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginInput {
    /// Account email.
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    /// Plaintext password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Second-factor login step input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TotpLoginInput {
    /// Pre-authentication token from the password step.
    #[validate(length(min = 1, message = "Pre-authentication token is required"))]
    pub pre_auth_token: String,
    /// Submitted one-time code.
    #[validate(custom(function = rules::totp_code_shape))]
    pub code: String,
}

/// Email verification input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyEmailInput {
    /// Raw verification token from the email link.
    #[validate(length(min = 1, message = "Verification token is required"))]
    pub token: String,
}

/// Forgot-password input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordInput {
    /// Account email.
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
}

/// Password reset input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordInput {
    /// Raw reset token from the email link.
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    /// Replacement password.
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = rules::password_complexity)
    )]
    pub new_password: String,
    /// Password confirmation.
    #[validate(must_match(other = new_password, message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Authenticated password change input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = rules::new_password_differs, skip_on_field_errors = false))]
pub struct ChangePasswordInput {
    /// Current password, re-verified before the change is accepted.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// Replacement password.
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = rules::password_complexity)
    )]
    pub new_password: String,
    /// Password confirmation.
    #[validate(must_match(other = new_password, message = "Passwords do not match"))]
    pub confirm_password: String,
}

/// Bare one-time-code input, used by TOTP enrollment confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TotpCodeInput {
    /// Submitted one-time code.
    #[validate(custom(function = rules::totp_code_shape))]
    pub code: String,
}
