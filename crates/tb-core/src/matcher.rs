//! Core Matching Engine
//!
//! This is the hot path - every outgoing request goes through `matches`.
//! The common case (host never registered) is answered by the bloom filter
//! without touching the domain index.
//!
//! Patterns without a domain cannot be keyed. Once any are loaded, every
//! query that the domain stage does not block scans them in order, so their
//! cost grows linearly with `MatcherStats::generic_count`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::bloom::BloomFilter;
use crate::config::MatcherConfig;
use crate::domain_index::{walk_host_suffixes, DomainIndex};
use crate::error::{ConfigError, RuleError};
use crate::observer::{LogObserver, MatcherObserver};
use crate::pattern::{compile, CompiledPattern};
use crate::types::{InitSummary, MatcherStats};
use crate::url::{extract_host, to_lower};

// =============================================================================
// Query Counters
// =============================================================================

#[derive(Debug, Default)]
struct QueryCounters {
    queries: AtomicU64,
    bloom_rejections: AtomicU64,
    bloom_false_positives: AtomicU64,
    blocked: AtomicU64,
}

impl QueryCounters {
    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        for counter in [&self.queries, &self.bloom_rejections, &self.bloom_false_positives, &self.blocked] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

// =============================================================================
// Pattern Matcher
// =============================================================================

/// Tracker URL matcher.
///
/// Starts uninitialized: `matches` returns `false` until `initialize` has run.
/// Every failure mode degrades to "rule skipped" or "not blocked".
pub struct PatternMatcher {
    config: MatcherConfig,
    bloom: BloomFilter,
    index: DomainIndex,
    /// Patterns with no domain, checked by substring on every query
    generic: Vec<Arc<CompiledPattern>>,
    by_original: HashMap<String, Arc<CompiledPattern>>,
    observer: Arc<dyn MatcherObserver>,
    counters: QueryCounters,
    initialized: bool,
}

impl PatternMatcher {
    /// Create a matcher with the default configuration, logging through `log`.
    pub fn new() -> Self {
        Self::build(MatcherConfig::default())
    }

    /// Create a matcher with a custom configuration.
    pub fn with_config(config: MatcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Replace the event observer.
    pub fn with_observer(mut self, observer: Arc<dyn MatcherObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn build(config: MatcherConfig) -> Self {
        Self {
            bloom: BloomFilter::new(config.bloom_filter_size_bits, config.hash_function_count),
            index: DomainIndex::new(),
            generic: Vec::new(),
            by_original: HashMap::new(),
            observer: Arc::new(LogObserver),
            counters: QueryCounters::default(),
            initialized: false,
            config,
        }
    }

    /// Load a rule set and start accepting queries.
    ///
    /// Bad rules are skipped and reported to the observer. Once `max_patterns`
    /// is reached the remaining rules are dropped. The matcher is marked
    /// initialized even if nothing was added.
    pub fn initialize<I, S>(&mut self, rules: I) -> InitSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = InitSummary::default();
        let mut rules = rules.into_iter();

        while let Some(rule) = rules.next() {
            if self.by_original.len() >= self.config.max_patterns {
                summary.dropped = 1 + rules.by_ref().count();
                self.observer.on_capacity_reached(self.config.max_patterns, summary.dropped);
                break;
            }

            let rule = rule.as_ref();
            match self.try_add_pattern(rule) {
                Ok(()) => summary.added += 1,
                Err(reason) => {
                    summary.skipped += 1;
                    self.observer.on_rule_skipped(rule, &reason);
                }
            }
        }

        self.initialized = true;
        self.observer.on_initialized(&summary);
        summary
    }

    /// Add one rule. Returns `false` (and changes nothing) when the rule is
    /// empty, too long, already present, or capacity is reached.
    pub fn add_pattern(&mut self, raw: &str) -> bool {
        match self.try_add_pattern(raw) {
            Ok(()) => true,
            Err(RuleError::CapacityReached { max }) => {
                self.observer.on_capacity_reached(max, 1);
                false
            }
            Err(_) => false,
        }
    }

    /// Add one rule, reporting why it was rejected.
    ///
    /// Rules are trimmed; the trimmed text is the key for duplicate checks
    /// and removal.
    pub fn try_add_pattern(&mut self, raw: &str) -> Result<(), RuleError> {
        let rule = raw.trim();
        if rule.is_empty() {
            return Err(RuleError::Empty);
        }

        let len = rule.chars().count();
        if len > self.config.max_pattern_length {
            return Err(RuleError::TooLong {
                len,
                max: self.config.max_pattern_length,
            });
        }

        if self.by_original.contains_key(rule) {
            return Err(RuleError::Duplicate);
        }

        if self.by_original.len() >= self.config.max_patterns {
            return Err(RuleError::CapacityReached {
                max: self.config.max_patterns,
            });
        }

        let pattern = Arc::new(compile(rule));
        self.bloom.insert_hash(pattern.hash());
        if !self.index.insert(Arc::clone(&pattern)) {
            self.generic.push(Arc::clone(&pattern));
        }
        self.by_original.insert(rule.to_string(), pattern);

        Ok(())
    }

    /// Remove a rule by its text. Returns `false` if it was not present.
    ///
    /// The bloom filter keeps the rule's bits; the domain index is what
    /// decides, so a removed rule never matches again.
    pub fn remove_pattern(&mut self, raw: &str) -> bool {
        let rule = raw.trim();
        let Some(pattern) = self.by_original.remove(rule) else {
            return false;
        };

        match pattern.domain() {
            Some(domain) => {
                self.index.remove(domain, rule);
            }
            None => self.generic.retain(|p| p.original() != rule),
        }

        true
    }

    /// Should a request to `url` be blocked?
    ///
    /// `false` when uninitialized, or when the URL is empty or malformed.
    #[inline]
    pub fn matches(&self, url: &str) -> bool {
        self.find_match(url).is_some()
    }

    /// Like [`PatternMatcher::matches`], returning the first pattern that matched.
    pub fn find_match(&self, url: &str) -> Option<&CompiledPattern> {
        if !self.initialized || url.is_empty() {
            return None;
        }

        // ASCII lowercasing keeps byte offsets, so the host slice stays valid.
        let url = to_lower(url);
        let host = extract_host(&url)?;

        QueryCounters::bump(&self.counters.queries);

        let bloom_hit = walk_host_suffixes(host).any(|suffix| self.bloom.may_contain(suffix));

        if bloom_hit {
            let mut had_candidates = false;
            // `bucket` borrows only the index, so hits outlive the lowercased URL.
            for suffix in walk_host_suffixes(host) {
                for pattern in self.index.bucket(suffix) {
                    had_candidates = true;
                    if pattern.matches_url(&url) {
                        QueryCounters::bump(&self.counters.blocked);
                        return Some(&**pattern);
                    }
                }
            }
            if !had_candidates {
                QueryCounters::bump(&self.counters.bloom_false_positives);
            }
        } else if self.generic.is_empty() {
            QueryCounters::bump(&self.counters.bloom_rejections);
            return None;
        }

        let found = self.generic.iter().find(|p| p.matches_url(&url))?;
        QueryCounters::bump(&self.counters.blocked);
        Some(&**found)
    }

    /// Current counts and bloom filter health.
    ///
    /// The fill ratio is a linear popcount over the bit array.
    pub fn stats(&self) -> MatcherStats {
        MatcherStats {
            pattern_count: self.by_original.len(),
            domain_count: self.index.domain_count(),
            generic_count: self.generic.len(),
            bloom_filter_fill_ratio: self.bloom.fill_ratio(),
            estimated_false_positive_rate: self.bloom.estimated_false_positive_rate(),
            bloom_filter_size_bits: self.bloom.size_bits(),
            hash_function_count: self.bloom.hash_count(),
            initialized: self.initialized,
            queries: self.counters.queries.load(Ordering::Relaxed),
            bloom_rejections: self.counters.bloom_rejections.load(Ordering::Relaxed),
            bloom_false_positives: self.counters.bloom_false_positives.load(Ordering::Relaxed),
            blocked: self.counters.blocked.load(Ordering::Relaxed),
        }
    }

    /// Drop every pattern, zero the bloom filter and return to uninitialized.
    pub fn clear(&mut self) {
        self.bloom.clear();
        self.index.clear();
        self.generic.clear();
        self.by_original.clear();
        self.counters.reset();
        self.initialized = false;
        self.observer.on_cleared();
    }

    /// Rebuild the bloom filter from the stored patterns only, shedding bits
    /// left behind by removed rules. Patterns and state are unchanged.
    pub fn compact(&mut self) {
        self.bloom.clear();
        for pattern in self.by_original.values() {
            self.bloom.insert_hash(pattern.hash());
        }
    }

    /// Bloom pre-filter probe for a domain (or a generic rule's text).
    pub fn may_contain(&self, key: &str) -> bool {
        self.bloom.may_contain(key)
    }

    pub fn contains_pattern(&self, raw: &str) -> bool {
        self.by_original.contains_key(raw.trim())
    }

    /// Stored patterns, in no particular order.
    pub fn patterns(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.by_original.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.by_original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_original.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PatternMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatcher")
            .field("config", &self.config)
            .field("patterns", &self.by_original.len())
            .field("domains", &self.index.domain_count())
            .field("generic", &self.generic.len())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
