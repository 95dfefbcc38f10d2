//! Sieve Core Library
//!
//! This crate provides the matching side of the Sieve filter engine: compiled
//! rules, the token index that prunes the rule set per query, and the matcher
//! that evaluates candidates.
//!
//! # Architecture
//!
//! Rules are registered in an inverted index keyed by the word tokens of
//! their pattern. A query tokenizes the URL the same way, probes the matching
//! buckets and evaluates each candidate's layered predicate (type, domain,
//! pattern). Once built, the index and its rules are immutable and can be
//! queried from many threads at once.
//!
//! # Modules
//!
//! - `types`: type-option catalog and element type sets
//! - `url`: tokenizer and hostname collaborators
//! - `pattern`: filter pattern to regex translation
//! - `rule`: compiled rule and its match predicate
//! - `index`: token index and its builder
//! - `matcher`: query engine

pub mod index;
pub mod matcher;
pub mod pattern;
pub mod rule;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use index::{Index, IndexBuilder};
pub use matcher::{MatchResult, Matcher};
pub use pattern::{CompiledPattern, PatternError, PatternToken};
pub use rule::{Rule, RuleOptions};
pub use types::{ElementTypes, TypeOption};
pub use url::{FastHostParser, HostnameParser, UrlHostParser};
