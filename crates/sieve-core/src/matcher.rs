//! Core Matching Engine
//!
//! A query tokenizes the URL exactly like patterns are tokenized at build
//! time, probes the index bucket of each token in URL order, and evaluates
//! the candidates of each bucket in list order. The first rule that matches
//! wins, so the answer follows URL-token order rather than list order.

use std::collections::HashSet;
use std::ops::Range;

use crate::index::Index;
use crate::rule::Rule;
use crate::types::ElementTypes;
use crate::url::{significant_tokens, HostnameParser, UrlHostParser};

// =============================================================================
// Matcher
// =============================================================================

/// Query engine over a built [`Index`].
pub struct Matcher<'a> {
    index: &'a Index,
    hosts: &'a dyn HostnameParser,
}

/// A successful query.
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    /// The rule that matched
    pub rule: &'a Rule,
    /// URL token whose bucket held the rule
    pub token: String,
    /// Byte range of the pattern match in the URL
    pub span: Range<usize>,
}

static DEFAULT_HOSTS: UrlHostParser = UrlHostParser;

impl<'a> Matcher<'a> {
    /// Create a matcher using the WHATWG hostname parser.
    pub fn new(index: &'a Index) -> Self {
        Self {
            index,
            hosts: &DEFAULT_HOSTS,
        }
    }

    /// Create a matcher with a custom hostname collaborator.
    pub fn with_host_parser(index: &'a Index, hosts: &'a dyn HostnameParser) -> Self {
        Self { index, hosts }
    }

    pub fn index(&self) -> &'a Index {
        self.index
    }

    /// Find the first rule matching `url`.
    pub fn query(&self, url: &str, element_types: Option<ElementTypes>) -> Option<MatchResult<'a>> {
        let mut probed: HashSet<&str> = HashSet::new();

        for token in significant_tokens(url) {
            if !probed.insert(token) {
                continue;
            }

            let bucket = self.index.bucket(token);
            log::trace!("probe token={} candidates={}", token, bucket.len());

            for rule in bucket {
                if let Some(span) = rule.match_span(url, element_types, self.hosts) {
                    log::debug!("matched {} via token {}", rule.source(), token);
                    return Some(MatchResult {
                        rule: rule.as_ref(),
                        token: token.to_string(),
                        span,
                    });
                }
            }
        }

        None
    }

    /// Whether any rule matches `url`.
    pub fn is_blocked(&self, url: &str, element_types: Option<ElementTypes>) -> bool {
        self.query(url, element_types).is_some()
    }
}
