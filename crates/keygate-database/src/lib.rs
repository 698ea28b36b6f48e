//! # keygate-database
//!
//! Durable credential store for Keygate: PostgreSQL connection management,
//! the migration runner, the [`store::CredentialStore`] contract, and its
//! PostgreSQL and in-memory implementations.

pub mod connection;
pub mod migration;
pub mod store;

pub use connection::DatabasePool;
pub use store::{CredentialStore, LockoutSnapshot, MemoryCredentialStore, PgCredentialStore};
