//! Thread-safe matcher handle
//!
//! Queries take a read lock and run concurrently; mutations take the write
//! lock. A poisoned lock is recovered, not propagated.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::RuleError;
use crate::matcher::PatternMatcher;
use crate::types::{InitSummary, MatcherStats};

/// Cloneable, `Send + Sync` handle to one [`PatternMatcher`].
#[derive(Debug, Clone, Default)]
pub struct SharedMatcher {
    inner: Arc<RwLock<PatternMatcher>>,
}

impl SharedMatcher {
    pub fn new(matcher: PatternMatcher) -> Self {
        Self {
            inner: Arc::new(RwLock::new(matcher)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PatternMatcher> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, PatternMatcher> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn matches(&self, url: &str) -> bool {
        self.read().matches(url)
    }

    /// Text of the rule that blocks `url`, if any.
    pub fn find_match_rule(&self, url: &str) -> Option<String> {
        self.read().find_match(url).map(|p| p.original().to_string())
    }

    pub fn stats(&self) -> MatcherStats {
        self.read().stats()
    }

    pub fn initialize<I, S>(&self, rules: I) -> InitSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write().initialize(rules)
    }

    pub fn add_pattern(&self, raw: &str) -> bool {
        self.write().add_pattern(raw)
    }

    pub fn try_add_pattern(&self, raw: &str) -> Result<(), RuleError> {
        self.write().try_add_pattern(raw)
    }

    pub fn remove_pattern(&self, raw: &str) -> bool {
        self.write().remove_pattern(raw)
    }

    pub fn clear(&self) {
        self.write().clear()
    }

    pub fn compact(&self) {
        self.write().compact()
    }

    /// Run `f` with read access to the underlying matcher.
    pub fn with_matcher<R>(&self, f: impl FnOnce(&PatternMatcher) -> R) -> R {
        f(&self.read())
    }
}

impl From<PatternMatcher> for SharedMatcher {
    fn from(matcher: PatternMatcher) -> Self {
        Self::new(matcher)
    }
}
