//! Synchronized random number generation.
//!
//! Every participant derives the same `ChaCha8` stream from the session seed
//! and the tick number, so draws made during resolution and advancement
//! agree bit for bit. Nothing else in the simulation may be a source of
//! randomness.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The per-tick synced random stream.
#[derive(Debug, Clone)]
pub struct SyncRng {
    inner: ChaCha8Rng,
}

impl SyncRng {
    /// The stream for `tick` of a session seeded with `seed`.
    ///
    /// The seed selects the key and the tick selects the `ChaCha` stream, so
    /// streams of different ticks never overlap.
    pub fn for_tick(seed: u64, tick: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(tick);
        Self { inner }
    }

    /// Next raw 32-bit draw.
    pub fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    /// Uniform draw from `0..=max`.
    pub fn up_to(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.inner.random_range(0..=max)
    }
}
