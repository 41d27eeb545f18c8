//! Random number generator abstraction for determinism.
//!
//! In production, this wraps a real RNG. In tests and replays,
//! a seeded or recorded implementation is injected.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;

    /// Generate a random `f64` in `[0.0, 1.0)`.
    fn next_f64(&mut self) -> f64;
}

/// Production RNG backed by `StdRng`. Seed it explicitly to replay a session.
#[derive(Debug, Clone)]
pub struct SeededRng(StdRng);

impl SeededRng {
    /// Creates an RNG with a fixed seed.
    #[must_use]
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// Creates an RNG seeded from the operating system.
    #[must_use]
    pub fn from_os() -> Self {
        Self(StdRng::from_os_rng())
    }
}

impl DeterministicRng for SeededRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.0.random_range(min..=max)
    }

    fn next_f64(&mut self) -> f64 {
        self.0.random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_produces_same_sequence() {
        let mut a = SeededRng::from_seed_u64(42);
        let mut b = SeededRng::from_seed_u64(42);

        let left: Vec<u32> = (0..32).map(|_| a.next_u32_range(1, 20)).collect();
        let right: Vec<u32> = (0..32).map(|_| b.next_u32_range(1, 20)).collect();

        assert_eq!(left, right);
    }

    #[test]
    fn test_range_is_inclusive_and_bounded() {
        let mut rng = SeededRng::from_seed_u64(7);
        for _ in 0..1_000 {
            let value = rng.next_u32_range(3, 5);
            assert!((3..=5).contains(&value));
        }
    }

    #[test]
    fn test_degenerate_range_returns_min() {
        let mut rng = SeededRng::from_seed_u64(1);
        assert_eq!(rng.next_u32_range(9, 9), 9);
    }
}
