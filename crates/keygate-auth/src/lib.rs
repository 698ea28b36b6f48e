//! # keygate-auth
//!
//! The cryptographic kernel of Keygate: password hashing, single-use token
//! digests, signed bearer tokens, TOTP second factor, and the lockout policy.
//!
//! ## Modules
//!
//! - `password` — Argon2id password hashing and verification
//! - `token` — random one-time tokens and their stored digests
//! - `jwt` — session and pre-authentication bearer tokens
//! - `totp` — TOTP enrollment and step-based code verification
//! - `lockout` — failed-attempt threshold and temporary account lock

pub mod jwt;
pub mod lockout;
pub mod password;
pub mod token;
pub mod totp;

pub use jwt::{Claims, IssuedBearer, TokenIssuer, TokenType, TokenVerifier};
pub use lockout::LockoutPolicy;
pub use password::PasswordHasher;
pub use token::{IssuedToken, OneTimeToken};
pub use totp::{TotpEnrollment, TotpManager};
