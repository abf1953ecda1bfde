//! Rotation-prime engine: pure ARX mixing, no per-call primality testing.
//!
//! A [`FastEngine`] is an ordinary owned value. Share it between threads
//! only behind a lock.

use rand_core::{RngCore, impls};

use crate::constants::LANE_CONSTANTS;
use crate::error::PrimixError;
use crate::mix::{DiffusionCore, PairSchedule, RotationTable};

/// 2^-53, the spacing of the floats produced by [`FastEngine::random_float`].
const FLOAT_SCALE: f64 = 1.0 / 9_007_199_254_740_992.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FastEngine {
    state: [u64; 4],
    rotation_primes: RotationTable,
    core: DiffusionCore<PairSchedule>,
}

impl FastEngine {
    /// Fixed seed lanes and the rotation-prime table. Always yields the same
    /// engine.
    pub fn new() -> Self {
        let rotation_primes = RotationTable::search();
        Self {
            state: LANE_CONSTANTS,
            rotation_primes,
            core: DiffusionCore::fast(rotation_primes),
        }
    }

    pub fn state(&self) -> &[u64; 4] {
        &self.state
    }

    pub fn rotation_primes(&self) -> &RotationTable {
        &self.rotation_primes
    }

    pub fn next_u64(&mut self) -> u64 {
        let [s0, s1, s2, s3] = self.state;
        let core = &self.core;
        let mixed = core.mix_pair(core.mix_pair(core.mix_pair(s0, s1), s2), s3);

        let prime = |i: usize| u64::from(self.rotation_primes.get(i).get());
        self.state = [
            core.mix_pair(s1, prime(0)),
            core.mix_pair(s2, prime(1)),
            core.mix_pair(s3, prime(2)),
            core.mix_pair(s0, prime(3)),
        ];
        mixed
    }

    /// Uniform-by-modulo value in `[min, max]`. Biased whenever the span does
    /// not divide 2^64.
    pub fn random_range(&mut self, min: i64, max: i64) -> Result<i64, PrimixError> {
        if min > max {
            return Err(PrimixError::EmptyIntRange { min, max });
        }
        let span = (max as u64).wrapping_sub(min as u64).wrapping_add(1);
        let value = self.next_u64();
        let offset = if span == 0 { value } else { value % span };
        Ok((min as u64).wrapping_add(offset) as i64)
    }

    /// Top 53 bits scaled into `[0, 1)`.
    pub fn random_float(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * FLOAT_SCALE
    }
}

impl Default for FastEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for FastEngine {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        FastEngine::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn init_is_deterministic() {
        let a = FastEngine::new();
        let b = FastEngine::new();
        assert_eq!(a, b);
        assert_eq!(a.state(), &LANE_CONSTANTS);
        assert_eq!(a.rotation_primes().amounts(), [7, 11, 13, 17, 19, 23, 29, 31]);
    }

    #[test]
    fn rotation_primes_are_valid_rotations() {
        let engine = FastEngine::new();
        for rotation in engine.rotation_primes().iter() {
            assert!((1..=63).contains(&rotation.get()));
        }
    }

    #[test]
    fn streams_are_reproducible() {
        let mut a = FastEngine::new();
        let mut b = FastEngine::new();
        for _ in 0..10_000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn state_rotates_every_call() {
        let mut engine = FastEngine::new();
        let before = *engine.state();
        engine.next_u64();
        assert_ne!(&before, engine.state());
        assert_eq!(engine.rotation_primes(), FastEngine::new().rotation_primes());
    }

    #[test]
    fn random_range_stays_in_bounds() {
        let mut engine = FastEngine::new();
        for _ in 0..10_000 {
            let v = engine.random_range(-5, 5).unwrap();
            assert!((-5..=5).contains(&v));
        }
        assert_eq!(engine.random_range(42, 42), Ok(42));
        let full = engine.random_range(i64::MIN, i64::MAX);
        assert!(full.is_ok());
    }

    #[test]
    fn random_range_hits_every_value() {
        let mut engine = FastEngine::new();
        let mut seen = [false; 6];
        for _ in 0..1000 {
            seen[engine.random_range(0, 5).unwrap() as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn empty_range_rejected() {
        let mut engine = FastEngine::new();
        assert_eq!(
            engine.random_range(3, 2),
            Err(PrimixError::EmptyIntRange { min: 3, max: 2 })
        );
    }

    #[test]
    fn floats_in_unit_interval() {
        let mut engine = FastEngine::new();
        let mut sum = 0.0;
        for _ in 0..100_000 {
            let f = engine.random_float();
            assert!((0.0..1.0).contains(&f));
            sum += f;
        }
        let mean = sum / 100_000.0;
        assert!((mean - 0.5).abs() < 0.01, "mean drifted: {mean}");
    }

    #[test]
    fn rng_core_matches_inherent_stream() {
        let mut engine = FastEngine::new();
        let mut reference = FastEngine::new();
        let mut buf = [0u8; 16];
        engine.fill_bytes(&mut buf);
        assert_eq!(&buf[..8], &reference.next_u64().to_le_bytes());
        assert_eq!(&buf[8..], &reference.next_u64().to_le_bytes());

        let roll: u8 = engine.gen_range(1..=6);
        assert!((1..=6).contains(&roll));
    }
}
