use serde::Serialize;

use sieve_compiler::{BuildReport, BuildStats};
use sieve_core::matcher::MatchResult;
use sieve_core::types::{ElementTypes, TypeOption};

#[derive(Debug, Serialize)]
pub struct MatchReport<'a> {
    pub url: &'a str,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct RuleReport<'a> {
    pub source: &'a str,
    pub pattern: &'a str,
    pub options: &'a str,
    pub matched_elements: ElementTypes,
    pub excluded_elements: ElementTypes,
    pub enabled_domains: Vec<&'a str>,
    pub disabled_domains: Vec<&'a str>,
    pub token: &'a str,
    pub span: [usize; 2],
}

impl<'a> MatchReport<'a> {
    pub fn new(url: &'a str, result: Option<&'a MatchResult<'a>>) -> Self {
        let rule = result.map(|m| RuleReport {
            source: m.rule.source(),
            pattern: m.rule.pattern(),
            options: m.rule.option_text(),
            matched_elements: m.rule.matched_elements(),
            excluded_elements: m.rule.excluded_elements(),
            enabled_domains: m.rule.enabled_domains().iter().map(String::as_str).collect(),
            disabled_domains: m.rule.disabled_domains().iter().map(String::as_str).collect(),
            token: &m.token,
            span: [m.span.start, m.span.end],
        });
        Self {
            url,
            matched: rule.is_some(),
            rule,
        }
    }

    pub fn print_text(&self) {
        let Some(rule) = &self.rule else {
            println!("no match: {}", self.url);
            return;
        };

        println!("blocked: {}", self.url);
        println!("  Rule:        {}", rule.source);
        println!("  Pattern:     {}", rule.pattern);
        println!("  Matched:     {}", rule.matched_elements);
        if !rule.excluded_elements.is_empty() {
            println!("  Excluded:    {}", rule.excluded_elements);
        }
        if !rule.enabled_domains.is_empty() {
            println!("  Domains:     {}", rule.enabled_domains.join("|"));
        }
        if !rule.disabled_domains.is_empty() {
            println!("  Not domains: {}", rule.disabled_domains.join("|"));
        }
        println!("  Token:       {}", rule.token);
        println!("  Span:        {}..{}", rule.span[0], rule.span[1]);
    }
}

#[derive(Debug, Serialize)]
pub struct StatsReport<'a> {
    #[serde(flatten)]
    pub stats: BuildStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEntry<'a> {
    pub line_number: usize,
    pub line: &'a str,
    pub error: String,
}

impl<'a> StatsReport<'a> {
    pub fn new(report: &'a BuildReport, with_errors: bool) -> Self {
        let errors = if with_errors {
            report
                .errors
                .iter()
                .map(|e| ErrorEntry {
                    line_number: e.line_number,
                    line: &e.line,
                    error: e.error.to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            stats: report.stats,
            errors,
        }
    }

    pub fn print_text(&self, path: &str) {
        let s = &self.stats;
        println!("Filter list: {}", path);
        println!("  Lines:       {}", s.lines);
        println!("  Rules:       {} ({} unindexed)", s.rules, s.unindexed);
        println!("  Tokens:      {}", s.tokens);
        println!("  Comments:    {}", s.comments);
        println!("  Cosmetic:    {}", s.cosmetic);
        println!("  Blank:       {}", s.blank);
        println!("  Errors:      {}", s.errors);
        for e in &self.errors {
            println!("    line {}: {} ({})", e.line_number, e.error, e.line);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TypeEntry {
    pub id: TypeOption,
    pub description: &'static str,
}

pub fn type_catalog() -> Vec<TypeEntry> {
    TypeOption::ALL
        .into_iter()
        .map(|opt| TypeEntry {
            id: opt,
            description: opt.description(),
        })
        .collect()
}
