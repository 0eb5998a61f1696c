//! Seeded environment with a manually driven clock.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use cds_core::{Environment, TrustError};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Default simulated start time: 2026-10-16T00:00:00Z.
const DEFAULT_START_SECS: u64 = 1_792_108_800;

/// Deterministic environment for tests.
///
/// Clones share the RNG stream and the clock, so a cipher and a verifier
/// built from the same `SimEnv` observe the same time.
#[derive(Debug, Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
    clock: Arc<Mutex<SystemTime>>,
}

impl SimEnv {
    /// Environment seeded with `seed`, clock at the default start time.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
            clock: Arc::new(Mutex::new(UNIX_EPOCH + Duration::from_secs(DEFAULT_START_SECS))),
        }
    }

    /// Set the clock.
    #[must_use]
    pub fn at(self, time: SystemTime) -> Self {
        self.set_time(time);
        self
    }

    /// Move the clock to `time`.
    pub fn set_time(&self, time: SystemTime) {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }

    /// Advance the clock by `by`.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock += by;
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> SystemTime {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), TrustError> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
        Ok(())
    }
}
