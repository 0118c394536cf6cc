//! Runtime configuration for the command line front end.

use clap::Parser;

use crate::entropy::{EntropyPool, ENTROPY_THRESHOLD};
use crate::matcher::{MatchPattern, PatternError};
use crate::worker::{SearchRequest, MAX_WORKERS};

/// Ethereum Vanity Address Search
///
/// Seeds one deterministic key stream per worker from collected entropy and
/// searches for an address with the given hex prefix and/or suffix.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Prefix to search for, right after 0x (hex characters only)
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Suffix to search for (hex characters only)
    #[arg(short, long, default_value = "")]
    pub suffix: String,

    /// Case sensitive matching against the EIP-55 checksum address
    #[arg(short = 'c', long, default_value = "false")]
    pub case_sensitive: bool,

    /// Number of worker threads, 1-16 (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Entropy bytes as hex (at least 100 bytes); collected interactively when omitted
    #[arg(long)]
    pub entropy: Option<String>,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count capped at 16
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get().min(MAX_WORKERS))
    }

    /// Validates the configuration, returning the compiled pattern
    pub fn validate(&self) -> Result<MatchPattern, ConfigError> {
        let pattern = self.pattern()?;

        let workers = self.worker_count();
        if !(1..=MAX_WORKERS).contains(&workers) {
            return Err(ConfigError::InvalidWorkers(workers));
        }

        if self.report_interval == 0 {
            return Err(ConfigError::InvalidReportInterval);
        }

        self.entropy_pool()?;
        Ok(pattern)
    }

    /// Compiles the prefix and suffix into a pattern
    pub fn pattern(&self) -> Result<MatchPattern, ConfigError> {
        Ok(MatchPattern::new(
            self.prefix.as_str(),
            self.suffix.as_str(),
            self.case_sensitive,
        )?)
    }

    /// Decodes `--entropy`, if given
    pub fn entropy_pool(&self) -> Result<Option<EntropyPool>, ConfigError> {
        let Some(ref entropy) = self.entropy else {
            return Ok(None);
        };
        let digits = entropy.strip_prefix("0x").unwrap_or(entropy);
        let bytes = hex::decode(digits).map_err(|e| ConfigError::InvalidEntropy(e.to_string()))?;
        if bytes.len() < ENTROPY_THRESHOLD {
            return Err(ConfigError::InvalidEntropy(format!(
                "{} bytes given, at least {} required",
                bytes.len(),
                ENTROPY_THRESHOLD
            )));
        }
        Ok(Some(EntropyPool::from(bytes)))
    }

    /// Builds the search request for `entropy`
    pub fn request(&self, entropy: EntropyPool) -> SearchRequest {
        SearchRequest::new(
            self.prefix.as_str(),
            self.suffix.as_str(),
            self.case_sensitive,
            self.worker_count(),
            entropy,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    #[error("Worker count must be between 1 and 16 (got {0})")]
    InvalidWorkers(usize),
    #[error("Report interval must be at least 1 second")]
    InvalidReportInterval,
    #[error("Invalid entropy: {0}")]
    InvalidEntropy(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_config(prefix: &str, suffix: &str) -> Config {
        Config {
            prefix: prefix.into(),
            suffix: suffix.into(),
            case_sensitive: false,
            workers: None,
            entropy: None,
            report_interval: 5,
        }
    }

    #[test]
    fn test_valid_pattern() {
        assert!(make_test_config("dead", "").validate().is_ok());
        assert!(make_test_config("", "BEEF").validate().is_ok());
        assert!(make_test_config("", "").validate().is_ok());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            make_test_config("xyz", "").validate(),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = make_test_config("a", "");
        config.workers = Some(17);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWorkers(17))));
        config.workers = Some(16);
        assert!(config.validate().is_ok());
        assert!((1..=MAX_WORKERS).contains(&make_test_config("a", "").worker_count()));
    }

    #[test]
    fn test_zero_report_interval_is_rejected() {
        let mut config = make_test_config("a", "");
        config.report_interval = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidReportInterval)));
        config.report_interval = 1;
        assert_eq!(config.validate().unwrap(), config.pattern().unwrap());
    }

    #[test]
    fn test_entropy_flag() {
        let mut config = make_test_config("a", "");
        config.entropy = Some(format!("0x{}", "ab".repeat(ENTROPY_THRESHOLD)));
        let pool = config.entropy_pool().unwrap().unwrap();
        assert_eq!(pool.len(), ENTROPY_THRESHOLD);

        config.entropy = Some("ab".repeat(10));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEntropy(_))));

        config.entropy = Some("not hex".into());
        assert!(config.entropy_pool().is_err());
    }
}
