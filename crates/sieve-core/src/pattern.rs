//! Filter pattern translation
//!
//! A filter pattern is lexed into a list of [`PatternToken`]s by three
//! ordered passes: domain anchor (`||`), separator placeholder (`^`), then
//! wildcard (`*`). Each pass only splits the `Literal` tokens left by the
//! previous one, so syntax introduced by a pass is never re-read. The token
//! list is then rendered into a regex with every literal escaped.

use std::fmt;
use std::ops::Range;

use regex::Regex;

/// Regex for the `||` anchor: the scheme separator or a literal dot.
const DOMAIN_BOUNDARY_RE: &str = r"(?://|\.)";

/// Regex for the `^` placeholder: exactly one separator character.
const SEPARATOR_RE: &str = r"[/\\:+!@#$\^&*()|]";

/// Regex for the `*` wildcard.
const WILDCARD_RE: &str = ".*";

/// Characters `^` stands for.
pub const SEPARATOR_CHARS: &[char] = &[
    '/', '\\', ':', '+', '!', '@', '#', '$', '^', '&', '*', '(', ')', '|',
];

/// Error type for pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pattern does not compile: {0}")]
pub struct PatternError(String);

/// One unit of a lexed filter pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    /// Text matched verbatim
    Literal(String),
    /// `||` - `//` or `.`
    DomainBoundary,
    /// `^` - one separator character
    Separator,
    /// `*` - any run of characters
    Wildcard,
}

impl PatternToken {
    fn push_regex(&self, out: &mut String) {
        match self {
            Self::Literal(text) => out.push_str(&regex::escape(text)),
            Self::DomainBoundary => out.push_str(DOMAIN_BOUNDARY_RE),
            Self::Separator => out.push_str(SEPARATOR_RE),
            Self::Wildcard => out.push_str(WILDCARD_RE),
        }
    }
}

/// Lex a raw pattern. Pass order is anchor, separator, wildcard.
pub fn lex(pattern: &str) -> Vec<PatternToken> {
    let tokens = vec![PatternToken::Literal(pattern.to_string())];
    let tokens = split_literals(tokens, "||", PatternToken::DomainBoundary);
    let tokens = split_literals(tokens, "^", PatternToken::Separator);
    split_literals(tokens, "*", PatternToken::Wildcard)
}

/// Replace every occurrence of `needle` inside literal tokens with `marker`.
/// Non-literal tokens pass through untouched and empty literals are dropped.
fn split_literals(
    tokens: Vec<PatternToken>,
    needle: &str,
    marker: PatternToken,
) -> Vec<PatternToken> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let text = match token {
            PatternToken::Literal(text) => text,
            other => {
                out.push(other);
                continue;
            }
        };
        for (i, piece) in text.split(needle).enumerate() {
            if i > 0 {
                out.push(marker.clone());
            }
            if !piece.is_empty() {
                out.push(PatternToken::Literal(piece.to_string()));
            }
        }
    }
    out
}

/// Render a token list as regex source.
pub fn to_regex_source(tokens: &[PatternToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        token.push_regex(&mut out);
    }
    out
}

/// Compiled match predicate for a filter pattern.
#[derive(Clone)]
pub struct CompiledPattern {
    tokens: Vec<PatternToken>,
    regex: Regex,
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let tokens = lex(pattern);
        let source = to_regex_source(&tokens);
        let regex = Regex::new(&source).map_err(|e| PatternError(e.to_string()))?;
        Ok(Self { tokens, regex })
    }

    /// Unanchored search over the whole URL.
    #[inline]
    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    /// Byte range of the leftmost match.
    pub fn find(&self, url: &str) -> Option<Range<usize>> {
        self.regex.find(url).map(|m| m.range())
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.regex.as_str()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> CompiledPattern {
        CompiledPattern::compile(pattern).expect("pattern should compile")
    }

    #[test]
    fn lexes_in_pass_order() {
        assert_eq!(
            lex("||ads.example.com^*banner"),
            vec![
                PatternToken::DomainBoundary,
                PatternToken::Literal("ads.example.com".into()),
                PatternToken::Separator,
                PatternToken::Wildcard,
                PatternToken::Literal("banner".into()),
            ]
        );
    }

    #[test]
    fn triple_pipe_is_anchor_then_literal() {
        assert_eq!(
            lex("|||x"),
            vec![PatternToken::DomainBoundary, PatternToken::Literal("|x".into())]
        );
    }

    #[test]
    fn separator_class_is_not_rewritten_as_wildcard() {
        // '*' and '|' appear in the separator class; they must stay literal there
        let p = compile("a^b");
        assert!(p.is_match("a*b"));
        assert!(p.is_match("a|b"));
        assert!(!p.is_match("aXYZb"));
        assert!(!p.is_match("ab"));
    }

    #[test]
    fn separator_matches_exactly_one_class_char() {
        let p = compile("foo^");
        for c in SEPARATOR_CHARS {
            assert!(p.is_match(&format!("foo{c}")), "{c}");
        }
        assert!(!p.is_match("foo"));
        assert!(!p.is_match("foo."));
        assert!(!p.is_match("foo?"));
    }

    #[test]
    fn wildcard_matches_any_run() {
        let p = compile("*ads*");
        assert!(p.is_match("http://x.com/track/ads/banner.gif"));
        assert!(compile("ad*banner").is_match("adbanner"));
    }

    #[test]
    fn literals_are_escaped() {
        let p = compile("a.b+c?(d)");
        assert!(p.is_match("xa.b+c?(d)x"));
        assert!(!p.is_match("aXb+c?(d)"));
    }

    #[test]
    fn single_pipe_is_literal() {
        assert!(compile("|http").is_match("x|http"));
        assert!(!compile("|http").is_match("http://a"));
    }

    #[test]
    fn host_anchor_matches_domain_boundary() {
        let p = compile("||ads.example.com^");
        assert!(p.is_match("http://ads.example.com/x"));
        assert!(p.is_match("https://ads.example.com:8080/y"));
        assert!(!p.is_match("http://notads.example.com/x"));
        assert!(p.is_match("http://cdn.ads.example.com/x"));
    }

    #[test]
    fn find_reports_leftmost_span() {
        let p = compile("ads");
        assert_eq!(p.find("http://x.com/ads/ads"), Some(13..16));
        assert_eq!(p.find("http://x.com/"), None);
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let p = compile("");
        assert!(p.tokens().is_empty());
        assert!(p.is_match("anything"));
    }
}
