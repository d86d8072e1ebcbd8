//! Matcher configuration
//!
//! Built once, validated, then owned immutably by the matcher.

use serde::{Deserialize, Serialize};

use crate::bloom::{DEFAULT_HASH_COUNT, DEFAULT_SIZE_BITS};
use crate::error::ConfigError;

/// Default pattern capacity.
pub const DEFAULT_MAX_PATTERNS: usize = 100_000;

/// Rules longer than this are rejected.
pub const DEFAULT_MAX_PATTERN_LENGTH: usize = 500;

/// Upper bound on `hash_function_count`.
pub const MAX_HASH_FUNCTIONS: u32 = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MatcherConfig {
    /// Maximum number of stored patterns.
    pub max_patterns: usize,
    /// Bloom filter size in bits (rounded up to a multiple of 64).
    pub bloom_filter_size_bits: usize,
    /// Bloom filter hash functions (k).
    pub hash_function_count: u32,
    /// Maximum rule length in characters.
    pub max_pattern_length: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_patterns: DEFAULT_MAX_PATTERNS,
            bloom_filter_size_bits: DEFAULT_SIZE_BITS,
            hash_function_count: DEFAULT_HASH_COUNT,
            max_pattern_length: DEFAULT_MAX_PATTERN_LENGTH,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_patterns == 0 {
            return Err(ConfigError::ZeroMaxPatterns);
        }
        if self.bloom_filter_size_bits == 0 {
            return Err(ConfigError::ZeroBloomSize);
        }
        if self.hash_function_count == 0 || self.hash_function_count > MAX_HASH_FUNCTIONS {
            return Err(ConfigError::InvalidHashCount(self.hash_function_count));
        }
        if self.max_pattern_length == 0 {
            return Err(ConfigError::ZeroPatternLength);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MatcherConfig::default();
        assert_eq!(config.max_patterns, 100_000);
        assert_eq!(config.bloom_filter_size_bits, 8_388_608);
        assert_eq!(config.hash_function_count, 7);
        assert_eq!(config.max_pattern_length, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_fields() {
        let config = MatcherConfig { max_patterns: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxPatterns));

        let config = MatcherConfig { bloom_filter_size_bits: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBloomSize));

        let config = MatcherConfig { max_pattern_length: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPatternLength));
    }

    #[test]
    fn rejects_hash_count_out_of_range() {
        for k in [0, 33] {
            let config = MatcherConfig { hash_function_count: k, ..Default::default() };
            assert_eq!(config.validate(), Err(ConfigError::InvalidHashCount(k)));
        }
    }

    #[test]
    fn deserializes_partial_json() {
        let config: MatcherConfig = serde_json::from_str(r#"{"maxPatterns": 10}"#).expect("valid json");
        assert_eq!(config.max_patterns, 10);
        assert_eq!(config.hash_function_count, 7);
    }

    #[test]
    fn rejects_unknown_json_fields() {
        let result: Result<MatcherConfig, _> = serde_json::from_str(r#"{"maxPaterns": 10}"#);
        assert!(result.is_err());
    }
}
