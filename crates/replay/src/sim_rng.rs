//! Deterministic simulation RNG resource.
//!
//! Wraps `ChaCha8Rng` so identical seeds produce identical output on every
//! platform. The recording controller reseeds this at the start of every
//! recording and replay; host systems draw from `ResMut<SimRng>` instead of
//! `rand::thread_rng()` so a replayed session sees the same random stream.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seed used until the host or a recording session provides one.
const DEFAULT_SEED: u64 = 0;

/// Seedable RNG for all simulation randomness.
#[derive(Resource)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(DEFAULT_SEED))
    }
}

impl SimRng {
    /// Re-seed in place, discarding all prior stream state.
    pub fn reseed(&mut self, seed: u64) {
        self.0 = ChaCha8Rng::seed_from_u64(seed);
    }
}
