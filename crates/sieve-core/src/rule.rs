//! Compiled filter rules

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Range;

use crate::pattern::CompiledPattern;
use crate::types::ElementTypes;
use crate::url::{HostnameParser, UrlHostParser};

/// Option sets of a rule, as produced by the option parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOptions {
    pub matched_elements: ElementTypes,
    pub excluded_elements: ElementTypes,
    pub enabled_domains: BTreeSet<String>,
    pub disabled_domains: BTreeSet<String>,
}

/// An immutable compiled filter rule.
#[derive(Debug, Clone)]
pub struct Rule {
    source: String,
    pattern: String,
    option_text: String,
    compiled: CompiledPattern,
    options: RuleOptions,
}

impl Rule {
    /// Assemble a rule. An empty `matched_elements` set becomes `{other}`.
    pub fn new(
        source: impl Into<String>,
        pattern: impl Into<String>,
        option_text: impl Into<String>,
        compiled: CompiledPattern,
        mut options: RuleOptions,
    ) -> Self {
        if options.matched_elements.is_empty() {
            options.matched_elements = ElementTypes::OTHER;
        }
        Self {
            source: source.into(),
            pattern: pattern.into(),
            option_text: option_text.into(),
            compiled,
            options,
        }
    }

    /// Original filter line (trimmed).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Raw pattern part, before the `$`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Raw option string, after the `$`.
    pub fn option_text(&self) -> &str {
        &self.option_text
    }

    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }

    pub fn matched_elements(&self) -> ElementTypes {
        self.options.matched_elements
    }

    pub fn excluded_elements(&self) -> ElementTypes {
        self.options.excluded_elements
    }

    pub fn enabled_domains(&self) -> &BTreeSet<String> {
        &self.options.enabled_domains
    }

    pub fn disabled_domains(&self) -> &BTreeSet<String> {
        &self.options.disabled_domains
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    /// Whether the rule applies to `url` for the given request types.
    /// Hostnames are resolved with [`UrlHostParser`].
    pub fn matches(&self, url: &str, element_types: Option<ElementTypes>) -> bool {
        self.matches_with(url, element_types, &UrlHostParser)
    }

    pub fn matches_with(
        &self,
        url: &str,
        element_types: Option<ElementTypes>,
        hosts: &dyn HostnameParser,
    ) -> bool {
        self.check_constraints(url, element_types, hosts) && self.compiled.is_match(url)
    }

    /// Like [`Rule::matches_with`], returning the matched byte range.
    pub fn match_span(
        &self,
        url: &str,
        element_types: Option<ElementTypes>,
        hosts: &dyn HostnameParser,
    ) -> Option<Range<usize>> {
        if !self.check_constraints(url, element_types, hosts) {
            return None;
        }
        self.compiled.find(url)
    }

    /// Type layer, then domain layer. An empty type set counts as absent.
    fn check_constraints(
        &self,
        url: &str,
        element_types: Option<ElementTypes>,
        hosts: &dyn HostnameParser,
    ) -> bool {
        if let Some(types) = element_types.filter(|t| !t.is_empty()) {
            if types.intersects(self.options.excluded_elements) {
                return false;
            }
            // A modifier-only set such as {third-party} does not restrict the kind
            let matched = self.options.matched_elements;
            if matched != ElementTypes::OTHER
                && !matched.request_kinds().is_empty()
                && !types.intersects(matched)
            {
                return false;
            }
        }

        let enabled = &self.options.enabled_domains;
        let disabled = &self.options.disabled_domains;
        if !enabled.is_empty() || !disabled.is_empty() {
            // No host behaves as the empty host
            let host = hosts.hostname(url);
            let host = host.as_deref().unwrap_or("");
            if disabled.contains(host) {
                return false;
            }
            if !enabled.is_empty() && !enabled.contains(host) {
                return false;
            }
        }

        true
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
