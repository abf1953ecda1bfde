//! Core engines for the experimental PRIMIX generators.
//!
//! Two 64-bit generators share one ARX diffusion core:
//!
//! - [`SecureEngine`] injects freshly searched primes, blended with the
//!   digits of pi in 256-bit fixed-width arithmetic, into a four-lane mixer.
//! - [`FastEngine`] is pure mixing over four lanes and a table of rotation
//!   primes found once at construction.
//!
//! Neither engine is suitable for real key material. Both are deterministic
//! from construction; there is no seeding interface.

pub mod bigint;
pub mod constants;
pub mod derive;
pub mod error;
pub mod fast;
pub mod mix;
pub mod preset;
pub mod primality;
pub mod secure;
pub mod stats;

pub use crate::bigint::{DigitEncoding, FixedWidthInt};
pub use crate::derive::{DerivedKey, SecureToken, derive_key, generate_token};
pub use crate::error::PrimixError;
pub use crate::fast::FastEngine;
pub use crate::mix::{
    DiffusionCore, PairSchedule, QuadSchedule, Rotation, RotationTable, Schedule,
};
pub use crate::preset::{PrimeWidth, secure_preset};
pub use crate::primality::{MillerRabin, is_prime, is_prime_trial, next_prime_trial};
pub use crate::secure::{
    PrimeRange, SecureEngine, SecureParams, SecureState, find_prime, secure_next,
};
pub use crate::stats::{ReportError, StatsReport, timed_samples};
