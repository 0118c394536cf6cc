//! Pattern matching for Ethereum addresses.
//!
//! A pattern is a hex prefix and/or suffix. Case-insensitive patterns are
//! compared against the lowercase address; case-sensitive ones against its
//! EIP-55 checksum form.

mod pattern;

pub use pattern::{MatchPattern, MatchResult, PatternError, ADDRESS_HEX_LEN};
