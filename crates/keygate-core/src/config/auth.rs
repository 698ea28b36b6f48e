//! Password hashing and lockout configuration.

use serde::{Deserialize, Serialize};

/// Credential hashing and lockout configuration.
///
/// The Argon2id cost parameters are fixed at startup so that every
/// verification carries the same work factor (tuned to stay under ~250ms
/// on reference hardware).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Argon2id memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub argon2_memory_kib: u32,
    /// Argon2id iteration count.
    #[serde(default = "default_iterations")]
    pub argon2_iterations: u32,
    /// Argon2id parallelism lanes.
    #[serde(default = "default_parallelism")]
    pub argon2_parallelism: u32,
    /// Consecutive failed login attempts before lockout.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: i32,
    /// Account lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_memory_kib(),
            argon2_iterations: default_iterations(),
            argon2_parallelism: default_parallelism(),
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
        }
    }
}

fn default_memory_kib() -> u32 {
    19456
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

fn default_max_failed() -> i32 {
    5
}

fn default_lockout() -> u64 {
    60
}
