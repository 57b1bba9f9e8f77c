//! Seeded random source.
//!
//! Both sides of a session must draw the same numbers, so the generator is
//! derived only from a seed string: the string is hashed with XXH3-128 and
//! the digest seeds a PCG64 (MCG variant). Neither step depends on platform
//! or word size.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use xxhash_rust::xxh3::xxh3_128;

/// Deterministic generator whose whole output sequence is fixed by its seed.
#[derive(Clone, Debug)]
pub struct SeededRandom {
    seed: String,
    rng: Pcg64Mcg,
}

impl SeededRandom {
    /// Create a generator for the given seed string.
    pub fn new(seed: impl Into<String>) -> Self {
        let seed = seed.into();
        let digest = xxh3_128(seed.as_bytes());
        Self {
            rng: Pcg64Mcg::from_seed(digest.to_le_bytes()),
            seed,
        }
    }

    /// Create a generator with a fresh, non-deterministic seed.
    ///
    /// The seed must be shipped to the other side (see [`SeededRandom::seed`]).
    pub fn generate() -> Self {
        Self::new(generate_seed())
    }

    /// The seed string this generator was created from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let mantissa = self.rng.next_u64() >> 11;
        mantissa as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

/// A fresh seed string from the thread-local entropy source.
pub fn generate_seed() -> String {
    format!("{:016x}", rand::random::<u64>())
}
