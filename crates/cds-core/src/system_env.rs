//! Production Environment implementation using system time and RNG.

use std::time::SystemTime;

use crate::{TrustError, env::Environment};

/// Production environment using the system clock and OS entropy.
///
/// # Security
///
/// The RNG uses `getrandom`, which provides OS-level cryptographic
/// randomness suitable for AEAD nonces.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), TrustError> {
        getrandom::fill(buffer).map_err(|e| {
            tracing::error!("getrandom failed: {}", e);
            TrustError::Entropy(e.to_string())
        })
    }
}
