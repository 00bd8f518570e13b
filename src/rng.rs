use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::grid::DIRECTION_COUNT;

/// Owns the master seed and hands out one named ChaCha8 stream per system, so
/// adding or reordering RNG draws in one system never perturbs another.
pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> SystemRng<'_> {
        let master = &mut self.master;
        let entry = self.streams.entry(name.to_string()).or_insert_with(|| {
            let mut seed = [0u8; 8];
            master.fill_bytes(&mut seed);
            ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed))
        });
        SystemRng { inner: entry }
    }
}

pub struct SystemRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl RngCore for SystemRng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Draws the simulation rules lean on.
pub trait RngExt {
    /// Weighted coin flip.
    fn chance(&mut self, probability: f32) -> bool;
    /// Uniform compass direction in `0..8`.
    fn direction(&mut self) -> u8;
}

impl<R: Rng> RngExt for R {
    fn chance(&mut self, probability: f32) -> bool {
        self.gen::<f32>() < probability
    }

    fn direction(&mut self) -> u8 {
        self.gen_range(0..DIRECTION_COUNT)
    }
}
