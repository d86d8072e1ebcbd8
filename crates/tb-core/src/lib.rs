//! TrackBlock Core Library
//!
//! This crate provides the URL pattern matching engine for the TrackBlock
//! tracker blocker: given a request URL, decide whether it hits a known
//! tracker rule.
//!
//! # Architecture
//!
//! Rules are compiled once into `CompiledPattern`s. A bloom filter keyed on
//! rule domains rejects most requests from the host alone; survivors are
//! verified against a domain index by walking the host's suffixes. Rules
//! without a domain are checked by substring on every query.
//!
//! # Modules
//!
//! - `hash`: Murmur3 hashing and bloom index derivation
//! - `bloom`: Fixed-size bloom filter
//! - `pattern`: Rule dialect detection and compilation
//! - `domain_index`: Domain buckets and host-suffix walking
//! - `url`: Host extraction without allocations
//! - `matcher`: Core request matching engine
//! - `shared`: Lock-protected handle for multi-threaded hosts
//! - `observer`: Event reporting hooks
//! - `config`, `error`, `types`: Shared definitions

pub mod bloom;
pub mod config;
pub mod domain_index;
pub mod error;
pub mod hash;
pub mod matcher;
pub mod observer;
pub mod pattern;
pub mod shared;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use bloom::BloomFilter;
pub use config::MatcherConfig;
pub use error::{ConfigError, RuleError};
pub use hash::{hash_key, Hash64};
pub use matcher::PatternMatcher;
pub use observer::{LogObserver, MatcherObserver, NoopObserver};
pub use pattern::{CompiledPattern, PatternKind, PatternShape};
pub use shared::SharedMatcher;
pub use types::{InitSummary, MatcherStats};
