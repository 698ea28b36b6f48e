//! Single-use random tokens and their stored digests.

pub mod digest;

pub use digest::{IssuedToken, OneTimeToken};
