//! # 256-bit Token Identifiers and Amounts
//!
//! Token ids and balances are unsigned 256-bit integers. We use
//! `primitive_types::U256` rather than inventing a wide-integer type: its
//! `checked_add` / `checked_sub` give us overflow as a hard error, which is
//! the only acceptable behavior when the numbers are money.

use thiserror::Error;

pub use primitive_types::U256;

/// Identifier of a token type. Carries no meaning beyond grouping balances.
pub type TokenId = U256;

/// A token quantity, and the type of every stored balance.
pub type Amount = U256;

/// Errors produced while parsing a 256-bit number from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NumericError {
    #[error("invalid decimal number: {0}")]
    InvalidDecimal(String),

    #[error("invalid hex number: {0}")]
    InvalidHex(String),

    #[error("empty number")]
    Empty,
}

/// Big-endian 32-byte encoding of a 256-bit value. This is the word layout
/// the approval digests are defined over.
pub fn to_be_word(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}

/// 64 lowercase hex digits, zero padded, no prefix.
pub fn to_padded_hex(value: &U256) -> String {
    hex::encode(to_be_word(value))
}

/// Parses either a decimal string (`"11223344"`) or a `0x`-prefixed hex
/// string (`"0xab3f30"`).
pub fn parse_u256(s: &str) -> Result<U256, NumericError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(NumericError::Empty);
    }
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => Err(NumericError::Empty),
        Some(digits) => {
            U256::from_str_radix(digits, 16).map_err(|_| NumericError::InvalidHex(s.to_string()))
        }
        None => U256::from_dec_str(s).map_err(|_| NumericError::InvalidDecimal(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_be_word_layout() {
        let word = to_be_word(&U256::from(0x0102u64));
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert!(word[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_padded_hex_is_64_digits() {
        let s = to_padded_hex(&U256::from(11_223_344u64));
        assert_eq!(s.len(), 64);
        assert!(s.ends_with("ab4130"));
        assert_eq!(to_padded_hex(&U256::zero()), "0".repeat(64));
    }

    #[test]
    fn test_parse_decimal_and_hex() {
        assert_eq!(parse_u256("58319").unwrap(), U256::from(58_319u64));
        assert_eq!(parse_u256("0xe3cf").unwrap(), U256::from(58_319u64));
        assert_eq!(parse_u256(" 0 ").unwrap(), U256::zero());
    }

    #[test]
    fn test_parse_max_value() {
        let max = format!("0x{}", "f".repeat(64));
        assert_eq!(parse_u256(&max).unwrap(), U256::MAX);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_u256(""), Err(NumericError::Empty));
        assert_eq!(parse_u256("0x"), Err(NumericError::Empty));
        assert!(matches!(parse_u256("12ab"), Err(NumericError::InvalidDecimal(_))));
        assert!(matches!(parse_u256("0xzz"), Err(NumericError::InvalidHex(_))));
    }

    #[test]
    fn test_checked_arithmetic_is_hard_error() {
        assert!(U256::MAX.checked_add(U256::one()).is_none());
        assert!(U256::zero().checked_sub(U256::one()).is_none());
    }
}
