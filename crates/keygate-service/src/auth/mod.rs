//! The authentication orchestrator.

pub mod service;

pub use service::{AuthService, IssuedReset, LoginOutcome, Registration};
