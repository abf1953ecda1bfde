//! Token and key-derivation helpers driven by the secure engine.
//!
//! Experimental: the engine makes no security claim, so neither do these.

use serde::{Deserialize, Serialize};

use crate::error::PrimixError;
use crate::secure::SecureEngine;

pub const TOKEN_BYTES: usize = 32;
pub const SALT_BYTES: usize = 16;
pub const MIN_KEY_BYTES: usize = 16;
pub const MAX_KEY_BYTES: usize = 64;
pub const DEFAULT_KDF_ITERATIONS: u32 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureToken {
    pub timestamp: u64,
    pub bytes: [u8; TOKEN_BYTES],
}

impl SecureToken {
    /// `"{timestamp:016x}-{bytes as hex}"`.
    pub fn to_hex(&self) -> String {
        format!("{:016x}-{}", self.timestamp, hex::encode(self.bytes))
    }
}

pub fn generate_token(engine: &mut SecureEngine, timestamp: u64) -> Result<SecureToken, PrimixError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    engine.fill_bytes(&mut bytes)?;
    Ok(SecureToken { timestamp, bytes })
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedKey {
    pub key: Vec<u8>,
    pub salt: [u8; SALT_BYTES],
}

/// Stretches `password` into `key_len` bytes.
///
/// A fresh salt is drawn first, then password and salt bytes are shifted
/// into a 64-bit accumulator that absorbs one engine word per eight bytes,
/// followed by `iterations` plain absorptions. Key words chain from the
/// accumulator.
pub fn derive_key(
    engine: &mut SecureEngine,
    password: &[u8],
    key_len: usize,
    iterations: u32,
) -> Result<DerivedKey, PrimixError> {
    if !(MIN_KEY_BYTES..=MAX_KEY_BYTES).contains(&key_len) {
        return Err(PrimixError::InvalidParameter {
            name: "key_len",
            reason: "key length must be between 16 and 64 bytes",
        });
    }

    let mut salt = [0u8; SALT_BYTES];
    engine.fill_bytes(&mut salt)?;

    let mut state = 0u64;
    for (i, &b) in password.iter().enumerate() {
        state = (state << 8) | u64::from(b);
        if (i + 1) % 8 == 0 {
            state ^= engine.next_u64()?;
        }
    }
    for (i, &b) in salt.iter().enumerate() {
        state ^= u64::from(b) << ((i % 8) * 8);
        if (i + 1) % 8 == 0 {
            state ^= engine.next_u64()?;
        }
    }
    for _ in 0..iterations {
        state ^= engine.next_u64()?;
    }

    let mut key = vec![0u8; key_len];
    for chunk in key.chunks_mut(8) {
        let word = engine.next_u64()? ^ state;
        chunk.copy_from_slice(&word.to_le_bytes()[..chunk.len()]);
        state = word;
    }
    Ok(DerivedKey { key, salt })
}
