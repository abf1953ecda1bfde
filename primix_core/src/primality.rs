//! Primality oracles: trial division followed by Miller-Rabin for the
//! secure engine, plain trial division for the rotation-prime table.

use serde::{Deserialize, Serialize};

use crate::constants::{TRIAL_DIVISION_LIMIT, WITNESSES};
use crate::error::PrimixError;

/// Miller-Rabin with the first `rounds` witnesses of `[2, 3, 5, 7, 11]`.
///
/// Probabilistic: with all five witnesses every `n < 2_152_302_898_747` is
/// classified correctly, above that no stronger guarantee is offered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MillerRabin {
    rounds: u32,
}

impl MillerRabin {
    pub fn new(rounds: u32) -> Result<Self, PrimixError> {
        if rounds == 0 {
            return Err(PrimixError::InvalidParameter {
                name: "rounds",
                reason: "at least one Miller-Rabin round is required",
            });
        }
        Ok(Self { rounds })
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Number of witnesses actually tried.
    pub fn witnesses(&self) -> usize {
        (self.rounds as usize).min(WITNESSES.len())
    }

    pub fn test(&self, n: u64) -> bool {
        if n <= 3 {
            return n > 1;
        }
        if n % 2 == 0 || n % 3 == 0 {
            return false;
        }
        let mut i = 5u64;
        while i <= TRIAL_DIVISION_LIMIT && i * i <= n {
            if n % i == 0 || n % (i + 2) == 0 {
                return false;
            }
            i += 6;
        }

        let mut d = n - 1;
        let mut r = 0u32;
        while d % 2 == 0 {
            d >>= 1;
            r += 1;
        }

        WITNESSES
            .iter()
            .take(self.witnesses())
            .filter(|&&a| a < n - 2)
            .all(|&a| witness_passes(a, d, r, n))
    }
}

fn witness_passes(a: u64, d: u64, r: u32, n: u64) -> bool {
    let mut x = pow_mod(a, d, n);
    if x == 1 || x == n - 1 {
        return true;
    }
    for _ in 1..r {
        x = mul_mod(x, x, n);
        if x == n - 1 {
            return true;
        }
    }
    false
}

#[inline]
fn mul_mod(a: u64, b: u64, n: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(n)) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, n: u64) -> u64 {
    let mut acc = 1u64;
    base %= n;
    while exp != 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, n);
        }
        base = mul_mod(base, base, n);
        exp >>= 1;
    }
    acc
}

/// Trial division plus `min(rounds, 5)` Miller-Rabin witnesses.
pub fn is_prime(n: u64, rounds: u32) -> Result<bool, PrimixError> {
    Ok(MillerRabin::new(rounds)?.test(n))
}

/// Deterministic trial division up to `sqrt(n)`.
pub fn is_prime_trial(n: u64) -> bool {
    if n <= 3 {
        return n > 1;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5u64;
    while i.checked_mul(i).is_some_and(|sq| sq <= n) {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest prime `>= n`, by trial division.
pub fn next_prime_trial(mut n: u64) -> u64 {
    if n <= 2 {
        return 2;
    }
    if n % 2 == 0 {
        n += 1;
    }
    while !is_prime_trial(n) {
        n += 2;
    }
    n
}
