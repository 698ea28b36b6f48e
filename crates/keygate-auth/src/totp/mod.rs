//! TOTP second-factor enrollment and verification.

pub mod manager;

pub use manager::{TotpEnrollment, TotpManager};
