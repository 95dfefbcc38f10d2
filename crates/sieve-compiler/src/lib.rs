//! Sieve Filter List Compiler
//!
//! This crate compiles Adblock-Plus-style filter lines into `sieve_core`
//! rules and loads whole filter lists into a token index.

pub mod builder;
pub mod parser;

pub use builder::{
    build_index, build_index_with, build_index_with_report, classify_line, BuildReport, BuildStats,
    ErrorSink, FnSink, IgnoreErrors, LineError, LineKind,
};
pub use parser::{parse_options, CompilerConfig, DomainRef, RuleCompiler, RuleOption, SyntaxError};
