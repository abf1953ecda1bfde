use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PrimixError {
    #[error("invalid prime range [{lower}, {upper}]: need 2 <= lower < upper")]
    InvalidRange { lower: u64, upper: u64 },

    #[error("empty integer range: min {min} is greater than max {max}")]
    EmptyIntRange { min: i64, max: i64 },

    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },

    #[error("no prime found in [{lower}, {upper}] after {attempts} attempts")]
    PrimeSearchExhausted {
        lower: u64,
        upper: u64,
        attempts: u32,
    },

    #[error("malformed digit string: {found:?} at position {position}")]
    MalformedDigitString { position: usize, found: Option<char> },

    #[error("fixed-width integer exceeded {bits} bits")]
    CapacityExceeded { bits: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_range() {
        let err = PrimixError::InvalidRange { lower: 9, upper: 3 };
        assert_eq!(
            err.to_string(),
            "invalid prime range [9, 3]: need 2 <= lower < upper"
        );
    }

    #[test]
    fn display_exhausted() {
        let err = PrimixError::PrimeSearchExhausted {
            lower: 24,
            upper: 28,
            attempts: 64,
        };
        assert_eq!(
            err.to_string(),
            "no prime found in [24, 28] after 64 attempts"
        );
    }

    #[test]
    fn display_malformed_digits() {
        let err = PrimixError::MalformedDigitString {
            position: 2,
            found: Some('x'),
        };
        assert_eq!(
            err.to_string(),
            "malformed digit string: Some('x') at position 2"
        );
    }
}
