use serde::Deserialize;

use sieve_core::pattern::{CompiledPattern, PatternError};
use sieve_core::rule::{Rule, RuleOptions};
use sieve_core::types::TypeOption;
use sieve_core::url::normalize_host;

/// Error for a single filter line that cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("missing '$' option separator")]
    MissingOptionSeparator,
    #[error("expected one '$' option separator, found {count}")]
    MultipleOptionSeparators { count: usize },
    #[error("unknown option: {0:?}")]
    UnknownOption(String),
    #[error("empty domain in domain= option")]
    EmptyDomain,
    #[error("invalid domain in domain= option: {0:?}")]
    InvalidDomain(String),
    #[error("{0}")]
    Pattern(#[from] PatternError),
}

/// Compiler settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Accept lines without a `$` as a pattern with no options.
    pub allow_bare_patterns: bool,
}

/// One parsed entry of a `domain=` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRef {
    pub name: String,
    pub negated: bool,
}

/// One validated token of a rule's option string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOption {
    /// `<type>`
    Type(TypeOption),
    /// `~<type>`
    NotType(TypeOption),
    /// `domain=<list>`
    Domains(Vec<DomainRef>),
}

impl RuleOption {
    pub fn parse(token: &str) -> Result<Self, SyntaxError> {
        if let Some(list) = token.strip_prefix("domain=") {
            return parse_domain_list(list).map(Self::Domains);
        }

        if let Some(opt) = token.strip_prefix('~').and_then(TypeOption::from_id) {
            return Ok(Self::NotType(opt));
        }

        if let Some(opt) = TypeOption::from_id(token) {
            return Ok(Self::Type(opt));
        }

        Err(SyntaxError::UnknownOption(token.to_string()))
    }

    fn apply(self, options: &mut RuleOptions) {
        match self {
            Self::Type(opt) => options.matched_elements |= opt.flag(),
            Self::NotType(opt) => options.excluded_elements |= opt.flag(),
            Self::Domains(domains) => {
                for domain in domains {
                    if domain.negated {
                        options.disabled_domains.insert(domain.name);
                    } else {
                        options.enabled_domains.insert(domain.name);
                    }
                }
            }
        }
    }
}

/// Compiles single filter lines into rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCompiler {
    config: CompilerConfig,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile one filter line. Surrounding whitespace is not part of the rule.
    pub fn compile(&self, line: &str) -> Result<Rule, SyntaxError> {
        let source = line.trim();
        let (pattern, option_text) = self.split_rule_options(source)?;
        let compiled = CompiledPattern::compile(pattern)?;
        let options = parse_options(option_text)?;
        Ok(Rule::new(source, pattern, option_text, compiled, options))
    }

    fn split_rule_options<'l>(&self, line: &'l str) -> Result<(&'l str, &'l str), SyntaxError> {
        let mut parts = line.split('$');
        let pattern = parts.next().unwrap_or_default();
        let option_text = match parts.next() {
            Some(text) => text,
            None if self.config.allow_bare_patterns => "",
            None => return Err(SyntaxError::MissingOptionSeparator),
        };
        if parts.next().is_some() {
            return Err(SyntaxError::MultipleOptionSeparators {
                count: line.matches('$').count(),
            });
        }
        Ok((pattern, option_text))
    }
}

/// Parse an option string (the text after `$`).
pub fn parse_options(text: &str) -> Result<RuleOptions, SyntaxError> {
    let mut options = RuleOptions::default();
    if text.is_empty() {
        return Ok(options);
    }

    for raw in text.split(',') {
        RuleOption::parse(raw)?.apply(&mut options);
    }

    Ok(options)
}

/// Parse the value of a `domain=` option. Groups split on `,`, entries on
/// `|`; the `~` prefix is read per entry. Names are stored in the form the
/// hostname parsers report.
fn parse_domain_list(value: &str) -> Result<Vec<DomainRef>, SyntaxError> {
    let mut domains = Vec::new();

    for group in value.split(',') {
        for entry in group.split('|') {
            let (negated, name) = match entry.strip_prefix('~') {
                Some(rest) => (true, rest),
                None => (false, entry),
            };
            if name.is_empty() {
                return Err(SyntaxError::EmptyDomain);
            }
            if name.contains('=') || name.contains('~') {
                return Err(SyntaxError::InvalidDomain(entry.to_string()));
            }
            let name = normalize_host(name)
                .ok_or_else(|| SyntaxError::InvalidDomain(entry.to_string()))?;
            domains.push(DomainRef { name, negated });
        }
    }

    Ok(domains)
}
