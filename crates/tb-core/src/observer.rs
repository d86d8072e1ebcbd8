//! Matcher event reporting
//!
//! The matcher holds an `Arc<dyn MatcherObserver>` and reports skipped rules
//! and lifecycle events through it. Hosts pick how those surface: the default
//! [`LogObserver`] goes through the `log` facade, [`NoopObserver`] drops them.

use crate::error::RuleError;
use crate::types::InitSummary;

/// Receives matcher events. All methods default to doing nothing.
pub trait MatcherObserver: Send + Sync {
    /// A rule was rejected while initializing.
    fn on_rule_skipped(&self, _rule: &str, _reason: &RuleError) {}

    /// `max_patterns` was hit; `dropped` rules were not added.
    fn on_capacity_reached(&self, _max: usize, _dropped: usize) {}

    /// `initialize` finished.
    fn on_initialized(&self, _summary: &InitSummary) {}

    /// The matcher was reset to uninitialized.
    fn on_cleared(&self) {}
}

/// Forwards events to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl MatcherObserver for LogObserver {
    fn on_rule_skipped(&self, rule: &str, reason: &RuleError) {
        match reason {
            // Lists routinely repeat rules
            RuleError::Duplicate => log::debug!("Skipping duplicate rule: {}", rule),
            RuleError::TooLong { .. } => {
                let head: String = rule.chars().take(64).collect();
                log::warn!("Skipping rule '{}...': {}", head, reason);
            }
            _ => log::warn!("Skipping rule '{}': {}", rule, reason),
        }
    }

    fn on_capacity_reached(&self, max: usize, dropped: usize) {
        log::warn!("Pattern capacity of {} reached, {} rule(s) dropped", max, dropped);
    }

    fn on_initialized(&self, summary: &InitSummary) {
        log::info!(
            "Pattern matcher initialized: {} added, {} skipped, {} dropped",
            summary.added,
            summary.skipped,
            summary.dropped
        );
    }

    fn on_cleared(&self) {
        log::debug!("Pattern matcher cleared");
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatcherObserver for NoopObserver {}
