//! Constants shared by both engines.

pub const WORD_BITS: u32 = 64;
pub const MIN_ROTATION: u32 = 7;
pub const MAX_ROTATION: u32 = WORD_BITS - MIN_ROTATION;
pub const MIXING_STAGES: usize = 4;
pub const ROTATION_PRIMES: usize = 8;

/// Golden ratio, fractional bits.
pub const CONSTANT_PHI: u64 = 0x9E37_79B9_7F4A_7C15;
pub const CONSTANT_E: u64 = 0x8B8B_45C2_5F25_EA19;
pub const CONSTANT_PI: u64 = 0x243F_6A88_85A3_08D3;
pub const CONSTANT_ROOT2: u64 = 0x5F87_6A93_49D1_2EA7;

/// Initial lane values of both engines and the multipliers of the diffusion core.
pub const LANE_CONSTANTS: [u64; 4] = [CONSTANT_PHI, CONSTANT_E, CONSTANT_PI, CONSTANT_ROOT2];

pub const SECURITY_BITS: u32 = 256;
pub const MIN_PRIME_BITS: u32 = 63;
pub const SECURE_MIXING_ROUNDS: usize = 20;
pub const FIXED_WIDTH_WORDS: usize = (SECURITY_BITS / WORD_BITS) as usize;

pub const DEFAULT_PRIME_LOWER: u64 = 1 << (MIN_PRIME_BITS - 1);
pub const DEFAULT_PRIME_UPPER: u64 = (1 << MIN_PRIME_BITS) - 1;
pub const DEFAULT_MILLER_RABIN_ROUNDS: u32 = 20;
pub const DEFAULT_MAX_PRIME_ATTEMPTS: u32 = 1 << 16;

/// First fifty digits of pi, blended with fresh primes by the secure engine.
pub const PI_DIGITS: &str = "31415926535897932384626433832795028841971693993751";

pub const WITNESSES: [u64; 5] = [2, 3, 5, 7, 11];
pub const TRIAL_DIVISION_LIMIT: u64 = 100;

pub const TEST_SAMPLES: usize = 1_000_000;
pub const TEST_BUCKETS: usize = 1000;
pub const TEST_SEQUENCE_LENGTH: usize = 1000;
