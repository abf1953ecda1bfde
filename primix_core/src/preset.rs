use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MILLER_RABIN_ROUNDS;
use crate::secure::SecureParams;

const TOY_PRIME_LOWER: u64 = 1_000_000;
const TOY_PRIME_UPPER: u64 = 2_000_000;

/// Named prime-size presets for the secure engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimeWidth {
    /// Primes around 2^20; fast enough for statistical runs.
    Toy,
    /// 63-bit primes.
    #[default]
    Standard,
}

pub fn secure_preset(width: PrimeWidth) -> SecureParams {
    match width {
        PrimeWidth::Toy => SecureParams::new(
            TOY_PRIME_LOWER,
            TOY_PRIME_UPPER,
            DEFAULT_MILLER_RABIN_ROUNDS,
        ),
        PrimeWidth::Standard => SecureParams::default(),
    }
}
