//! Pattern matching implementation.

use crate::crypto::{Address, ADDRESS_MARKER};

/// Number of hex digits in an address.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

impl From<bool> for MatchResult {
    fn from(matched: bool) -> Self {
        if matched {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("{field} must contain only hex characters (0-9, a-f, A-F): {value:?}")]
    NotHex { field: &'static str, value: String },
    #[error("Combined prefix + suffix cannot be longer than 40 characters (got {0})")]
    TooLong(usize),
}

/// A validated prefix/suffix pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPattern {
    /// Prefix (lowercased unless case sensitive)
    prefix: String,
    /// Suffix (lowercased unless case sensitive)
    suffix: String,
    case_sensitive: bool,
}

fn check_hex(field: &'static str, value: &str) -> Result<(), PatternError> {
    if value.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(PatternError::NotHex {
            field,
            value: value.to_string(),
        })
    }
}

impl MatchPattern {
    /// Creates a pattern. Empty prefix or suffix always matches.
    pub fn new(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        case_sensitive: bool,
    ) -> Result<Self, PatternError> {
        let (prefix, suffix) = (prefix.into(), suffix.into());
        check_hex("Prefix", &prefix)?;
        check_hex("Suffix", &suffix)?;

        let total = prefix.len() + suffix.len();
        if total > ADDRESS_HEX_LEN {
            return Err(PatternError::TooLong(total));
        }

        let normalize = |s: String| if case_sensitive { s } else { s.to_lowercase() };

        Ok(Self {
            prefix: normalize(prefix),
            suffix: normalize(suffix),
            case_sensitive,
        })
    }

    /// True when any address matches.
    pub fn is_trivial(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }

    /// Matches an address against this pattern.
    #[inline]
    pub fn matches(&self, address: &Address) -> MatchResult {
        if self.is_trivial() {
            return MatchResult::Match;
        }
        let digits = if self.case_sensitive {
            address.checksum_digits()
        } else {
            address.to_hex()
        };
        self.matches_digits(&digits).into()
    }

    /// Matches a displayed address such as `0xAbC...`.
    pub fn matches_str(&self, address: &str) -> bool {
        let digits = address.strip_prefix(ADDRESS_MARKER).unwrap_or(address);
        if self.case_sensitive {
            self.matches_digits(digits)
        } else {
            self.matches_digits(&digits.to_lowercase())
        }
    }

    #[inline]
    fn matches_digits(&self, digits: &str) -> bool {
        digits.starts_with(&self.prefix) && digits.ends_with(&self.suffix)
    }

    /// Returns the expected number of attempts to find a match.
    ///
    /// Every digit has 16 possible values. A case-sensitive letter also has
    /// to land on the right checksum case, doubling its odds.
    pub fn estimated_difficulty(&self) -> u64 {
        self.prefix
            .chars()
            .chain(self.suffix.chars())
            .fold(1u64, |acc, c| {
                let odds = if self.case_sensitive && c.is_ascii_alphabetic() {
                    32
                } else {
                    16
                };
                acc.saturating_mul(odds)
            })
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl std::fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.prefix.is_empty() { "*" } else { self.prefix.as_str() };
        let suffix = if self.suffix.is_empty() { "*" } else { self.suffix.as_str() };
        write!(f, "{}{}...{}", ADDRESS_MARKER, prefix, suffix)?;
        if self.case_sensitive {
            write!(f, " (case sensitive)")?;
        }
        Ok(())
    }
}
