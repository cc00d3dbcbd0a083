// crates/ep_core/src/rng.rs
//
// Deterministic RNG for prediction jitter.
//
// The blend step draws one uniform value per party in [-margin, +margin].
// Reproducibility requires the caller to seed the generator explicitly;
// there is no ambient entropy source anywhere in the engine. Cross-platform
// determinism comes from explicit seeding plus a counted draw stream.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

/// Seeded generator for jitter draws.
///
/// Internally ChaCha20 with an explicit 32-byte seed derived from a 64-bit
/// seed (little-endian bytes in the first 8 positions; the rest 0). This
/// avoids endianness ambiguity and keeps the stream stable across platforms.
#[derive(Debug, Clone)]
pub struct JitterRng {
    rng: ChaCha20Rng,
    draws: u64,
}

impl JitterRng {
    /// Construct from a 64-bit seed. The mapping from `u64` to the ChaCha20
    /// 32-byte seed is explicit: `seed.to_le_bytes()` into the first 8
    /// bytes; the remaining 24 bytes are zero.
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            draws: 0,
        }
    }

    /// Number of uniform draws consumed so far.
    #[inline]
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform `f64` in `[0, 1)` from the top 53 bits of one RNG word.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.draws = self.draws.saturating_add(1);
        let x = self.rng.next_u64() >> 11;
        x as f64 / (1u64 << 53) as f64
    }

    /// Uniform `f64` in `[-bound, +bound)`. A zero bound consumes a draw
    /// and returns exactly 0, keeping the stream position independent of
    /// the configured margin.
    #[inline]
    pub fn symmetric(&mut self, bound: f64) -> f64 {
        bound * (2.0 * self.unit() - 1.0)
    }
}

// ------------------------------
// Tests (determinism & bounds)
// ------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = JitterRng::from_seed_u64(123456789);
        let mut b = JitterRng::from_seed_u64(123456789);
        for _ in 0..32 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = JitterRng::from_seed_u64(1);
        let mut b = JitterRng::from_seed_u64(2);
        let same = (0..16).all(|_| a.unit().to_bits() == b.unit().to_bits());
        assert!(!same);
    }

    #[test]
    fn unit_stays_in_half_open_interval() {
        let mut rng = JitterRng::from_seed_u64(0xDEAD_BEEF);
        for _ in 0..1000 {
            let u = rng.unit();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn symmetric_respects_bound_and_counts_draws() {
        let mut rng = JitterRng::from_seed_u64(7);
        for _ in 0..1000 {
            let v = rng.symmetric(0.03);
            assert!(v >= -0.03 && v < 0.03);
        }
        assert_eq!(rng.draws(), 1000);
    }

    #[test]
    fn zero_bound_is_exactly_zero_but_advances() {
        let mut rng = JitterRng::from_seed_u64(9);
        assert_eq!(rng.symmetric(0.0), 0.0);
        assert_eq!(rng.draws(), 1);
    }
}
