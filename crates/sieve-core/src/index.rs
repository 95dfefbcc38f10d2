//! Token-indexed rule store
//!
//! Each rule is registered under every significant token of its pattern.
//! Buckets keep insertion order, which is filter-list order. The builder is
//! append-only; `finish` freezes it into a read-only [`Index`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::matcher::Matcher;
use crate::rule::Rule;
use crate::types::ElementTypes;
use crate::url::significant_tokens;

/// Append-only index under construction.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    buckets: HashMap<String, Vec<Arc<Rule>>>,
    rule_count: usize,
    unindexed: usize,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under each significant token of its pattern.
    /// Returns the number of tokens it was registered under.
    pub fn insert(&mut self, rule: Rule) -> usize {
        let rule = Arc::new(rule);
        let mut registered = 0usize;

        for token in significant_tokens(rule.pattern()) {
            self.buckets
                .entry(token.to_string())
                .or_default()
                .push(Arc::clone(&rule));
            registered += 1;
        }

        self.rule_count += 1;
        if registered == 0 {
            self.unindexed += 1;
            log::debug!("rule has no index token: {}", rule.source());
        }
        registered
    }

    pub fn finish(self) -> Index {
        Index {
            buckets: self.buckets,
            rule_count: self.rule_count,
            unindexed: self.unindexed,
        }
    }
}

/// Read-only inverted index from token to rules.
#[derive(Debug, Default)]
pub struct Index {
    buckets: HashMap<String, Vec<Arc<Rule>>>,
    rule_count: usize,
    unindexed: usize,
}

impl Index {
    /// Rules registered under `token`, in insertion order.
    pub fn bucket(&self, token: &str) -> &[Arc<Rule>] {
        self.buckets.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.buckets.contains_key(token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn token_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of rules inserted, including unindexed ones.
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// Rules with no significant token; queries can never return them.
    pub fn unindexed_count(&self) -> usize {
        self.unindexed
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// First matching rule for `url`, probing buckets in URL-token order.
    pub fn query(&self, url: &str, element_types: Option<ElementTypes>) -> Option<&Rule> {
        Matcher::new(self).query(url, element_types).map(|m| m.rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::CompiledPattern;
    use crate::rule::RuleOptions;

    fn rule(pattern: &str) -> Rule {
        let compiled = CompiledPattern::compile(pattern).expect("pattern should compile");
        Rule::new(pattern, pattern, "", compiled, RuleOptions::default())
    }

    #[test]
    fn registers_under_every_long_token() {
        let mut builder = IndexBuilder::new();
        assert_eq!(builder.insert(rule("||ads.example.com^")), 3);
        let index = builder.finish();

        assert_eq!(index.token_count(), 3);
        assert_eq!(index.bucket("ads").len(), 1);
        assert_eq!(index.bucket("example").len(), 1);
        assert_eq!(index.bucket("com").len(), 1);
        assert!(index.bucket("co").is_empty());
        assert!(index.tokens().all(|t| t.len() > 2));
    }

    #[test]
    fn buckets_keep_insertion_order_and_share_rules() {
        let mut builder = IndexBuilder::new();
        builder.insert(rule("/banner/ads"));
        builder.insert(rule("ads.js"));
        let index = builder.finish();

        let ads = index.bucket("ads");
        assert_eq!(ads.len(), 2);
        assert_eq!(ads[0].pattern(), "/banner/ads");
        assert_eq!(ads[1].pattern(), "ads.js");
        assert!(Arc::ptr_eq(&index.bucket("banner")[0], &ads[0]));
    }

    #[test]
    fn short_patterns_are_counted_but_unindexed() {
        let mut builder = IndexBuilder::new();
        assert_eq!(builder.insert(rule("/ad/")), 0);
        let index = builder.finish();

        assert!(index.is_empty());
        assert_eq!(index.rule_count(), 1);
        assert_eq!(index.unindexed_count(), 1);
        assert!(index.query("http://x.com/ad/", None).is_none());
    }

    #[test]
    fn index_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Index>();
        assert_send_sync::<Rule>();
    }
}
