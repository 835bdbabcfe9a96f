//! Shared value types: account addresses and 256-bit numbers.

pub mod address;
pub mod numeric;

pub use address::{Address, AddressError};
pub use numeric::{parse_u256, to_be_word, to_padded_hex, Amount, NumericError, TokenId, U256};
