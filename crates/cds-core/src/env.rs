//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples trust logic from system resources (wall
//! clock, randomness). This enables:
//!
//! - Deterministic tests: a fixed clock makes freshness checks reproducible
//!   and a seeded RNG makes nonces reproducible.
//!
//! - Production runtime: [`SystemEnv`](crate::SystemEnv) uses the system
//!   clock and OS entropy without any change to the verification logic.
//!
//! # Invariants
//!
//! - Isolation: implementations must not share global state
//! - Entropy: production implementations must report failure rather than
//!   hand out predictable bytes

use std::time::SystemTime;

use cds_proto::NONCE_LEN;

use crate::TrustError;

/// Abstract environment providing wall-clock time and randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. Clock accuracy: `now()` reflects real UTC time in production, since
///    report freshness and certificate validity are judged against it
/// 2. RNG quality: `random_bytes()` uses cryptographically secure entropy in
///    production
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current wall-clock time.
    fn now(&self) -> SystemTime;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Security
    ///
    /// Production implementations MUST use OS entropy (`getrandom`). On
    /// failure they must return an error; filling the buffer with a fallback
    /// pattern would repeat AEAD nonces.
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), TrustError>;

    /// Draws a fresh AEAD nonce.
    fn nonce(&self) -> Result<[u8; NONCE_LEN], TrustError> {
        let mut nonce = [0u8; NONCE_LEN];
        self.random_bytes(&mut nonce)?;
        Ok(nonce)
    }
}
