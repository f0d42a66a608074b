//! Deterministic seed hashing and the reproducible random stream.
//!
//! Every generator and simulation step in the engine draws randomness through
//! [`SeededRng`] so that a whole run is reproducible from a single integer
//! seed. [`hash_seed`] folds coordinate/counter tuples into derived seeds for
//! scoped streams (per-placement, per-entity, per-octave).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET: u32 = 0x811C_9DC5;
/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 16_777_619;

/// Order-sensitive integer mixing function.
///
/// FNV-1a style: start from the offset basis, XOR each input then multiply by
/// the prime. `hash_seed(&[a, b]) != hash_seed(&[b, a])` in general, which is
/// what lets callers build scoped seeds from (seed, x, z, counter) tuples.
pub fn hash_seed(parts: &[i64]) -> u32 {
    let mut h = FNV_OFFSET;
    for &part in parts {
        h ^= part as u32;
        h = h.wrapping_mul(FNV_PRIME);
        // Fold in the high half so coordinates beyond 32 bits still matter.
        h ^= (part >> 32) as u32;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Reproducible pseudo-random stream.
///
/// Two instances constructed with the same seed produce identical sequences.
/// Thin facade over [`StdRng`] with the value-range helpers the generators
/// use.
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: StdRng,
}

impl SeededRng {
    /// Create a stream from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a stream from hashed seed components.
    pub fn from_parts(parts: &[i64]) -> Self {
        Self::new(hash_seed(parts) as u64)
    }

    /// Next value in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform value in `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Uniform integer in `[min, max]` inclusive.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        self.rng.gen_range(min..=max)
    }

    /// Bernoulli trial with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f64) -> bool {
        self.next() < p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_seed_is_deterministic_and_order_sensitive() {
        assert_eq!(hash_seed(&[1, 2, 3]), hash_seed(&[1, 2, 3]));
        assert_ne!(hash_seed(&[1, 2, 3]), hash_seed(&[3, 2, 1]));
        assert_ne!(hash_seed(&[0]), hash_seed(&[0, 0]));
    }

    #[test]
    fn hash_seed_distinguishes_negative_coordinates() {
        assert_ne!(hash_seed(&[-1, 5]), hash_seed(&[1, 5]));
    }

    #[test]
    fn identical_seeds_produce_identical_streams() {
        let mut a = SeededRng::new(12345);
        let mut b = SeededRng::new(12345);
        for _ in 0..100 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::new(1);
        let mut b = SeededRng::new(2);
        let same = (0..20).filter(|_| a.next() == b.next()).count();
        assert!(same < 20, "streams from different seeds should diverge");
    }

    #[test]
    fn next_stays_in_unit_interval() {
        let mut rng = SeededRng::new(7);
        for _ in 0..1000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v), "value {} out of [0,1)", v);
        }
    }

    #[test]
    fn int_is_inclusive_on_both_ends() {
        let mut rng = SeededRng::new(99);
        let mut saw_min = false;
        let mut saw_max = false;
        for _ in 0..1000 {
            let v = rng.int(1, 3);
            assert!((1..=3).contains(&v));
            saw_min |= v == 1;
            saw_max |= v == 3;
        }
        assert!(saw_min && saw_max);
    }

    #[test]
    fn chance_respects_extremes() {
        let mut rng = SeededRng::new(5);
        for _ in 0..100 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }

    #[test]
    fn range_spans_requested_interval() {
        let mut rng = SeededRng::new(11);
        for _ in 0..1000 {
            let v = rng.range(-2.5, 4.0);
            assert!((-2.5..4.0).contains(&v));
        }
    }
}
