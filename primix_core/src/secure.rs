//! Prime-gated engine.
//!
//! Every output draws eight primes from [`SecureState::find_prime`], blends
//! each pair with the digits of pi through [`FixedWidthInt`] and folds the
//! result into a four-lane mixer.
//!
//! The state is a plain value: keep one [`SecureState`] (or
//! [`SecureEngine`]) per thread of use, or guard a shared one with a lock.
//! Concurrent unsynchronised use would interleave counter and mixer updates.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::bigint::{DigitEncoding, FixedWidthInt};
use crate::constants::{
    DEFAULT_MAX_PRIME_ATTEMPTS, DEFAULT_MILLER_RABIN_ROUNDS, DEFAULT_PRIME_LOWER,
    DEFAULT_PRIME_UPPER, LANE_CONSTANTS, MIXING_STAGES, PI_DIGITS,
};
use crate::error::PrimixError;
use crate::mix::{DiffusionCore, QuadSchedule};
use crate::primality::MillerRabin;

const CORE: DiffusionCore<QuadSchedule> = DiffusionCore::secure();

/// Inclusive prime search bounds with `2 <= lower < upper`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimeRange {
    lower: u64,
    upper: u64,
}

impl PrimeRange {
    pub fn new(lower: u64, upper: u64) -> Result<Self, PrimixError> {
        if lower < 2 || lower >= upper {
            return Err(PrimixError::InvalidRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> u64 {
        self.lower
    }

    pub fn upper(&self) -> u64 {
        self.upper
    }

    /// Number of integers in the range. Cannot overflow since `lower >= 2`.
    pub fn span(&self) -> u64 {
        self.upper - self.lower + 1
    }

    /// Maps a mixed word onto an odd candidate inside the range.
    fn candidate(&self, mixed: u64) -> u64 {
        let candidate = self.lower + mixed % self.span();
        if candidate % 2 == 1 {
            candidate
        } else if candidate < self.upper {
            candidate + 1
        } else {
            candidate - 1
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureParams {
    pub prime_lower: u64,
    pub prime_upper: u64,
    pub rounds: u32,
    pub max_attempts: u32,
    pub encoding: DigitEncoding,
}

impl SecureParams {
    pub const fn new(prime_lower: u64, prime_upper: u64, rounds: u32) -> Self {
        Self {
            prime_lower,
            prime_upper,
            rounds,
            max_attempts: DEFAULT_MAX_PRIME_ATTEMPTS,
            encoding: DigitEncoding::Decimal,
        }
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_encoding(mut self, encoding: DigitEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn range(&self) -> Result<PrimeRange, PrimixError> {
        PrimeRange::new(self.prime_lower, self.prime_upper)
    }

    pub fn oracle(&self) -> Result<MillerRabin, PrimixError> {
        MillerRabin::new(self.rounds)
    }

    pub fn validate(&self) -> Result<(), PrimixError> {
        self.range()?;
        self.oracle()?;
        if self.max_attempts == 0 {
            return Err(PrimixError::InvalidParameter {
                name: "max_attempts",
                reason: "prime search needs at least one attempt",
            });
        }
        Ok(())
    }
}

impl Default for SecureParams {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRIME_LOWER,
            DEFAULT_PRIME_UPPER,
            DEFAULT_MILLER_RABIN_ROUNDS,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureState {
    pub counter: u64,
    /// Xor-accumulated call counter; never read from a clock.
    pub timestamp: u64,
    pub mixer: [u64; 4],
}

impl Default for SecureState {
    fn default() -> Self {
        Self {
            counter: 0,
            timestamp: 0,
            mixer: LANE_CONSTANTS,
        }
    }
}

impl SecureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces one output word, drawing two primes per mixer lane.
    ///
    /// Works on a copy of the state and commits it only on success, so a
    /// failed call (invalid parameters or an exhausted prime search) leaves
    /// `self` untouched.
    pub fn next(&mut self, params: &SecureParams) -> Result<u64, PrimixError> {
        params.validate()?;
        let range = params.range()?;
        let oracle = params.oracle()?;

        let mut next = *self;
        next.counter = next.counter.wrapping_add(1);
        next.timestamp ^= next.counter;

        for lane in 0..MIXING_STAGES {
            // The blend rewrites the whole mixer, so read the lane afterwards.
            let entropy = next.blend(range, oracle, params)?;
            next.mixer[lane] ^= entropy;
            next.mixer[lane] = CORE.mix_quad(next.mixer);
        }
        *self = next;
        Ok(self.mixer[3])
    }

    /// Draws candidates from the mixer until `oracle` accepts one.
    ///
    /// Each attempt advances the counter, including the attempts of a search
    /// that ends in exhaustion. Candidates are forced odd and stay
    /// within `range`. Fails with [`PrimixError::PrimeSearchExhausted`] after
    /// `max_attempts` rejected candidates.
    pub fn find_prime(
        &mut self,
        range: PrimeRange,
        oracle: MillerRabin,
        max_attempts: u32,
    ) -> Result<u64, PrimixError> {
        for _ in 0..max_attempts {
            self.counter = self.counter.wrapping_add(1);
            let c = self.counter;
            let mixed = CORE.mix_quad([
                self.mixer[0] ^ c,
                self.mixer[1] ^ (c >> 16),
                self.mixer[2] ^ (c << 16),
                self.mixer[3],
            ]);
            let candidate = range.candidate(mixed);
            if oracle.test(candidate) {
                return Ok(candidate);
            }
        }
        debug!(
            "prime search exhausted: range=[{}, {}] attempts={} counter={}",
            range.lower(),
            range.upper(),
            max_attempts,
            self.counter
        );
        Err(PrimixError::PrimeSearchExhausted {
            lower: range.lower(),
            upper: range.upper(),
            attempts: max_attempts,
        })
    }

    fn blend(
        &mut self,
        range: PrimeRange,
        oracle: MillerRabin,
        params: &SecureParams,
    ) -> Result<u64, PrimixError> {
        let p1 = self.find_prime(range, oracle, params.max_attempts)?;
        let p2 = self.find_prime(range, oracle, params.max_attempts)?;

        let pi = FixedWidthInt::parse(PI_DIGITS, params.encoding)?;
        let quotient = match params.encoding {
            DigitEncoding::Decimal => pi.mul_scalar(p1)?.div_scalar(p2)?.0.low_word(),
            // Only the low word of the product survives before the division.
            DigitEncoding::LegacyNibble => pi.low_word().wrapping_mul(p1) / p2,
        };

        self.mixer[0] ^= p1;
        self.mixer[1] ^= p2;
        self.mixer[2] ^= quotient;
        self.mixer[3] = CORE.mix_quad(self.mixer);
        Ok(self.mixer[3])
    }
}

/// One secure output with the default attempt bound and decimal digits.
pub fn secure_next(
    state: &mut SecureState,
    lower: u64,
    upper: u64,
    rounds: u32,
) -> Result<u64, PrimixError> {
    state.next(&SecureParams::new(lower, upper, rounds))
}

/// Prime search with the default attempt bound.
pub fn find_prime(
    state: &mut SecureState,
    lower: u64,
    upper: u64,
    rounds: u32,
) -> Result<u64, PrimixError> {
    let range = PrimeRange::new(lower, upper)?;
    let oracle = MillerRabin::new(rounds)?;
    state.find_prime(range, oracle, DEFAULT_MAX_PRIME_ATTEMPTS)
}

/// A [`SecureState`] bundled with the parameters it is driven with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecureEngine {
    state: SecureState,
    params: SecureParams,
}

impl SecureEngine {
    pub fn new() -> Self {
        Self {
            state: SecureState::default(),
            params: SecureParams::default(),
        }
    }

    pub fn with_params(params: SecureParams) -> Result<Self, PrimixError> {
        params.validate()?;
        debug!(
            "secure engine: primes in [{}, {}], rounds={}, max_attempts={}, encoding={:?}",
            params.prime_lower, params.prime_upper, params.rounds, params.max_attempts, params.encoding
        );
        Ok(Self {
            state: SecureState::default(),
            params,
        })
    }

    pub fn next_u64(&mut self) -> Result<u64, PrimixError> {
        self.state.next(&self.params)
    }

    /// Fills `out` with little-endian output words.
    pub fn fill_bytes(&mut self, out: &mut [u8]) -> Result<(), PrimixError> {
        for chunk in out.chunks_mut(8) {
            let word = self.next_u64()?.to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        Ok(())
    }

    pub fn state(&self) -> &SecureState {
        &self.state
    }

    pub fn params(&self) -> &SecureParams {
        &self.params
    }
}

impl Default for SecureEngine {
    fn default() -> Self {
        Self::new()
    }
}
