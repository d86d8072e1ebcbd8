//! TrackBlock Filter List Loader
//!
//! This crate turns EasyList-style and hosts-file text into the rule strings
//! `tb_core::PatternMatcher` accepts. Element hiding, exceptions and rules
//! with `$` options are counted and skipped.

pub mod optimizer;
pub mod parser;

pub use optimizer::{dedupe_rules, merge_rule_sets};
pub use parser::{parse_filter_list, ListStats, ParsedList};
