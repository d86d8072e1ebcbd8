//! Shared result types for the matcher.

use serde::Serialize;

/// Outcome of one `initialize` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSummary {
    /// Rules compiled and stored
    pub added: usize,
    /// Rules rejected (empty, too long, duplicate)
    pub skipped: usize,
    /// Rules not looked at because capacity was reached
    pub dropped: usize,
}

/// Diagnostics snapshot returned by `PatternMatcher::stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatcherStats {
    /// Stored patterns
    pub pattern_count: usize,
    /// Distinct indexed domains
    pub domain_count: usize,
    /// Patterns without a domain. Each one is a substring scan on every
    /// query the domain stage does not block.
    pub generic_count: usize,
    /// Fraction of bloom bits set
    pub bloom_filter_fill_ratio: f64,
    /// `fill_ratio ^ k`
    pub estimated_false_positive_rate: f64,
    pub bloom_filter_size_bits: usize,
    pub hash_function_count: u32,
    pub initialized: bool,
    /// `matches` calls on an initialized matcher with a parsable URL
    pub queries: u64,
    /// Queries rejected by the bloom filter alone
    pub bloom_rejections: u64,
    /// Queries that passed the bloom filter but matched no domain pattern
    pub bloom_false_positives: u64,
    /// Queries that returned a match
    pub blocked: u64,
}
