//! # keygate-entity
//!
//! Domain entities for Keygate. The central type is the
//! [`credential::Credential`] record: the durable per-account
//! authentication state.

pub mod credential;

pub use credential::{Credential, CredentialRole, Identity, NewCredential, TotpState};
