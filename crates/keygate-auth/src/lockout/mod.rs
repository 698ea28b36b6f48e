//! Failed-attempt lockout policy.

pub mod policy;

pub use policy::LockoutPolicy;
