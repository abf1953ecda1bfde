//! 256-bit fixed-capacity unsigned integers.
//!
//! Only the handful of operations the secure engine needs to blend a
//! constant with two primes are provided. Storage never grows past
//! [`FIXED_WIDTH_WORDS`] words; a result that would need more fails with
//! [`PrimixError::CapacityExceeded`] instead of being truncated.

use serde::{Deserialize, Serialize};

use crate::constants::{FIXED_WIDTH_WORDS, SECURITY_BITS, WORD_BITS};
use crate::error::PrimixError;

/// How a digit string is turned into words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigitEncoding {
    /// Positional base-10 conversion.
    #[default]
    Decimal,
    /// Packs every digit into a 4-bit field without positional weighting, as
    /// the legacy generator did on 64-bit targets. Digit `i` (from the least
    /// significant end) lands in word `i / 64` at bit `(4 * i) % 64`, so
    /// digits past the sixteenth overlap earlier ones. The secure engine also
    /// truncates the blend product to one word in this mode.
    LegacyNibble,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedWidthInt {
    words: [u64; FIXED_WIDTH_WORDS],
    used_words: usize,
}

impl FixedWidthInt {
    pub const fn zero() -> Self {
        Self {
            words: [0; FIXED_WIDTH_WORDS],
            used_words: 0,
        }
    }

    pub fn from_u64(value: u64) -> Self {
        let mut out = Self::zero();
        out.words[0] = value;
        out.used_words = 1;
        out.trim();
        out
    }

    /// Builds a value from little-endian words.
    pub fn from_words(words: [u64; FIXED_WIDTH_WORDS]) -> Self {
        let mut out = Self {
            words,
            used_words: FIXED_WIDTH_WORDS,
        };
        out.trim();
        out
    }

    pub fn parse(digits: &str, encoding: DigitEncoding) -> Result<Self, PrimixError> {
        let bytes = digits.as_bytes();
        if bytes.is_empty() {
            return Err(PrimixError::MalformedDigitString {
                position: 0,
                found: None,
            });
        }
        if let Some(position) = bytes.iter().position(|b| !b.is_ascii_digit()) {
            return Err(PrimixError::MalformedDigitString {
                position,
                found: digits[position..].chars().next(),
            });
        }
        match encoding {
            DigitEncoding::Decimal => Self::parse_decimal(bytes),
            DigitEncoding::LegacyNibble => Self::parse_nibbles(bytes),
        }
    }

    fn parse_decimal(bytes: &[u8]) -> Result<Self, PrimixError> {
        let mut acc = Self::zero();
        for &b in bytes {
            acc = acc.mul_scalar(10)?.add_scalar(u64::from(b - b'0'))?;
        }
        Ok(acc)
    }

    fn parse_nibbles(bytes: &[u8]) -> Result<Self, PrimixError> {
        let mut out = Self::zero();
        for (i, &b) in bytes.iter().rev().enumerate() {
            let word_idx = i / WORD_BITS as usize;
            let shift = (i * 4) % WORD_BITS as usize;
            let slot = out.word_mut(word_idx)?;
            *slot |= u64::from(b - b'0') << shift;
        }
        out.used_words = FIXED_WIDTH_WORDS;
        out.trim();
        Ok(out)
    }

    pub fn words(&self) -> &[u64; FIXED_WIDTH_WORDS] {
        &self.words
    }

    pub fn used_words(&self) -> usize {
        self.used_words
    }

    pub fn low_word(&self) -> u64 {
        self.words[0]
    }

    pub fn is_zero(&self) -> bool {
        self.used_words == 0
    }

    pub fn add_scalar(&self, b: u64) -> Result<Self, PrimixError> {
        let mut out = *self;
        let mut carry = b;
        let mut idx = 0;
        while carry != 0 {
            let slot = out.word_mut(idx)?;
            let (sum, overflow) = slot.overflowing_add(carry);
            *slot = sum;
            carry = u64::from(overflow);
            idx += 1;
        }
        out.used_words = out.used_words.max(idx);
        out.trim();
        Ok(out)
    }

    /// Multiply-accumulate with a 128-bit carry. The result uses at most one
    /// more word than `self`.
    pub fn mul_scalar(&self, b: u64) -> Result<Self, PrimixError> {
        let mut out = Self::zero();
        let mut carry = 0u64;
        for i in 0..self.used_words {
            let prod = u128::from(self.words[i]) * u128::from(b) + u128::from(carry);
            out.words[i] = prod as u64;
            carry = (prod >> WORD_BITS) as u64;
        }
        out.used_words = self.used_words;
        if carry != 0 {
            *out.word_mut(self.used_words)? = carry;
            out.used_words += 1;
        }
        out.trim();
        Ok(out)
    }

    /// Long division from the most significant used word down. Returns the
    /// quotient and the remainder.
    pub fn div_scalar(&self, b: u64) -> Result<(Self, u64), PrimixError> {
        if b == 0 {
            return Err(PrimixError::InvalidParameter {
                name: "divisor",
                reason: "must be nonzero",
            });
        }
        let mut out = Self::zero();
        let mut remainder = 0u64;
        for i in (0..self.used_words).rev() {
            let current = (u128::from(remainder) << WORD_BITS) | u128::from(self.words[i]);
            out.words[i] = (current / u128::from(b)) as u64;
            remainder = (current % u128::from(b)) as u64;
        }
        out.used_words = self.used_words;
        out.trim();
        Ok((out, remainder))
    }

    fn word_mut(&mut self, idx: usize) -> Result<&mut u64, PrimixError> {
        self.words
            .get_mut(idx)
            .ok_or(PrimixError::CapacityExceeded {
                bits: SECURITY_BITS,
            })
    }

    fn trim(&mut self) {
        while self.used_words > 0 && self.words[self.used_words - 1] == 0 {
            self.used_words -= 1;
        }
    }
}

impl From<u64> for FixedWidthInt {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}
