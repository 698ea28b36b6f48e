//! Credential record domain entities.

pub mod model;
pub mod role;
pub mod totp;

pub use model::{Credential, Identity, NewCredential};
pub use role::CredentialRole;
pub use totp::TotpState;
