//! Error types for tb-core.
//!
//! None of these are fatal: a rejected rule is skipped and an invalid
//! configuration is reported before a matcher exists.

/// Why a rule was not added.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Empty rule")]
    Empty,
    #[error("Rule too long: {len} chars (max {max})")]
    TooLong { len: usize, max: usize },
    #[error("Duplicate rule")]
    Duplicate,
    #[error("Pattern capacity reached: {max}")]
    CapacityReached { max: usize },
}

/// Invalid `MatcherConfig` field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_patterns must be at least 1")]
    ZeroMaxPatterns,
    #[error("bloom_filter_size_bits must be at least 1")]
    ZeroBloomSize,
    #[error("hash_function_count must be between 1 and 32, got {0}")]
    InvalidHashCount(u32),
    #[error("max_pattern_length must be at least 1")]
    ZeroPatternLength,
}
