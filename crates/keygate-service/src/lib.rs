//! # keygate-service
//!
//! Use-case orchestration for Keygate. The [`AuthService`] facade sequences
//! the cryptographic kernel, the lockout policy, and the credential store to
//! implement registration, login (with the optional TOTP step), email
//! verification, password reset and change, and second-factor management.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time.

pub mod auth;
pub mod validation;

pub use auth::{AuthService, IssuedReset, LoginOutcome, Registration};
pub use validation::{
    ChangePasswordInput, ForgotPasswordInput, LoginInput, RegisterInput, ResetPasswordInput,
    TotpCodeInput, TotpLoginInput, VerifyEmailInput,
};
