//! Domain index and host-suffix walking
//!
//! Patterns with a domain are bucketed under that domain. A lookup walks the
//! request host from most to least specific, so a rule on `example.com` is
//! found for `tracker.example.com`. The walk stops before the last label: a
//! rule reduced to `com` never applies to every `.com` host.
//!
//! Multi-label public suffixes such as `co.uk` get no special treatment.

use std::collections::HashMap;
use std::sync::Arc;

use crate::pattern::CompiledPattern;

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

/// Iterator for suffix-walking a host, stopping before its last label.
pub struct HostSuffixIter<'a> {
    current: Option<&'a str>,
}

impl<'a> Iterator for HostSuffixIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;

        // Only step to a parent that still has at least two labels
        self.current = get_parent_domain(result).filter(|parent| parent.contains('.'));

        Some(result)
    }
}

/// Walk host suffixes from most specific to least specific.
///
/// `www.ads.example.com` yields `www.ads.example.com`, `ads.example.com`,
/// `example.com`. A single-label host yields only itself.
pub fn walk_host_suffixes(host: &str) -> HostSuffixIter<'_> {
    HostSuffixIter {
        current: if host.is_empty() { None } else { Some(host) },
    }
}

/// Mapping from a bare domain to the patterns anchored on it.
#[derive(Debug, Default)]
pub struct DomainIndex {
    buckets: HashMap<String, Vec<Arc<CompiledPattern>>>,
    patterns: usize,
}

impl DomainIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern under its domain. Patterns without a domain are ignored
    /// and `false` is returned.
    pub fn insert(&mut self, pattern: Arc<CompiledPattern>) -> bool {
        let Some(domain) = pattern.domain() else {
            return false;
        };
        self.buckets.entry(domain.to_string()).or_default().push(pattern);
        self.patterns += 1;
        true
    }

    /// Remove the pattern with the given original text from `domain`'s bucket.
    /// Empty buckets are dropped.
    pub fn remove(&mut self, domain: &str, original: &str) -> bool {
        let Some(bucket) = self.buckets.get_mut(domain) else {
            return false;
        };

        let before = bucket.len();
        bucket.retain(|p| p.original() != original);
        let removed = before - bucket.len();

        if bucket.is_empty() {
            self.buckets.remove(domain);
        }

        self.patterns -= removed;
        removed > 0
    }

    /// Patterns registered exactly under `domain`.
    pub fn bucket(&self, domain: &str) -> &[Arc<CompiledPattern>] {
        self.buckets.get(domain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Union of the buckets of `host` and each of its walked parents.
    pub fn patterns_for<'a>(&'a self, host: &'a str) -> impl Iterator<Item = &'a Arc<CompiledPattern>> + 'a {
        walk_host_suffixes(host).flat_map(move |suffix| self.bucket(suffix).iter())
    }

    /// Number of distinct domains with at least one pattern.
    pub fn domain_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total patterns across all buckets.
    pub fn pattern_count(&self) -> usize {
        self.patterns
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.patterns = 0;
    }
}
