use serde::Serialize;

use sieve_core::index::{Index, IndexBuilder};

use crate::parser::{RuleCompiler, SyntaxError};

/// A filter line that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line_number}: {error} ({line:?})")]
pub struct LineError {
    /// 1-based line number
    pub line_number: usize,
    pub line: String,
    #[source]
    pub error: SyntaxError,
}

/// Receives per-line compile failures during a build.
pub trait ErrorSink {
    fn report(&mut self, error: LineError);
}

impl ErrorSink for Vec<LineError> {
    fn report(&mut self, error: LineError) {
        self.push(error);
    }
}

/// Adapts a closure into an [`ErrorSink`].
pub struct FnSink<F>(pub F);

impl<F: FnMut(LineError)> ErrorSink for FnSink<F> {
    fn report(&mut self, error: LineError) {
        (self.0)(error)
    }
}

/// Discards errors; they are still logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreErrors;

impl ErrorSink for IgnoreErrors {
    fn report(&mut self, _error: LineError) {}
}

/// How a line of a filter list is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'l> {
    Blank,
    Comment,
    Cosmetic,
    Filter(&'l str),
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with('!') {
        LineKind::Comment
    } else if trimmed.contains("##") {
        LineKind::Cosmetic
    } else {
        LineKind::Filter(trimmed)
    }
}

/// Line counts of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub lines: usize,
    pub rules: usize,
    pub unindexed: usize,
    pub comments: usize,
    pub cosmetic: usize,
    pub blank: usize,
    pub errors: usize,
    pub tokens: usize,
}

/// Stats plus every per-line failure.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub stats: BuildStats,
    pub errors: Vec<LineError>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Build an index with the default compiler, reporting bad lines to `sink`.
pub fn build_index<I, S>(lines: I, sink: &mut S) -> Index
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    S: ErrorSink + ?Sized,
{
    build_index_with(&RuleCompiler::default(), lines, sink).0
}

/// Build an index, collecting errors into a [`BuildReport`].
pub fn build_index_with_report<I>(compiler: &RuleCompiler, lines: I) -> (Index, BuildReport)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut errors: Vec<LineError> = Vec::new();
    let (index, stats) = build_index_with(compiler, lines, &mut errors);
    (index, BuildReport { stats, errors })
}

/// Build an index from filter list lines.
///
/// Comments (`!`) and cosmetic rules (`##`) are skipped. A line that fails to
/// compile is handed to `sink` and the build continues with the next line.
pub fn build_index_with<I, S>(
    compiler: &RuleCompiler,
    lines: I,
    sink: &mut S,
) -> (Index, BuildStats)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    S: ErrorSink + ?Sized,
{
    let mut builder = IndexBuilder::new();
    let mut stats = BuildStats::default();

    for (i, raw_line) in lines.into_iter().enumerate() {
        let raw_line = raw_line.as_ref();
        stats.lines += 1;

        let line = match classify_line(raw_line) {
            LineKind::Blank => {
                stats.blank += 1;
                continue;
            }
            LineKind::Comment => {
                stats.comments += 1;
                continue;
            }
            LineKind::Cosmetic => {
                stats.cosmetic += 1;
                log::debug!("skipping cosmetic rule on line {}", i + 1);
                continue;
            }
            LineKind::Filter(line) => line,
        };

        match compiler.compile(line) {
            Ok(rule) => {
                stats.rules += 1;
                if builder.insert(rule) == 0 {
                    stats.unindexed += 1;
                }
            }
            Err(error) => {
                stats.errors += 1;
                let error = LineError {
                    line_number: i + 1,
                    line: line.to_string(),
                    error,
                };
                log::warn!("{}", error);
                sink.report(error);
            }
        }
    }

    let index = builder.finish();
    stats.tokens = index.token_count();

    log::info!(
        "built index: {} rules, {} tokens, {} errors, {} unindexed",
        stats.rules,
        stats.tokens,
        stats.errors,
        stats.unindexed
    );

    (index, stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sieve_core::matcher::Matcher;
    use sieve_core::types::ElementTypes;
    use sieve_core::url::FastHostParser;

    use crate::parser::CompilerConfig;

    use super::*;

    const LIST: [&str; 3] = ["! comment", "||doubleclick.net^$third-party", "image.png$~image"];

    #[test]
    fn end_to_end_list() {
        let mut errors: Vec<LineError> = Vec::new();
        let index = build_index(LIST, &mut errors);
        assert!(errors.is_empty());

        let rule = index
            .query("http://doubleclick.net/ad", Some(ElementTypes::SCRIPT))
            .expect("doubleclick should match");
        assert_eq!(rule.source(), LIST[1]);

        assert!(index
            .query("http://x.com/image.png", Some(ElementTypes::IMAGE))
            .is_none());

        let rule = index
            .query("http://x.com/image.png", Some(ElementTypes::SCRIPT))
            .expect("image.png should match for scripts");
        assert_eq!(rule.source(), LIST[2]);
        assert_eq!(rule.matched_elements(), ElementTypes::OTHER);
    }

    #[test]
    fn comments_produce_no_rules_or_tokens() {
        let (index, report) = build_index_with_report(
            &RuleCompiler::default(),
            ["! comment$script", "!||ads.example.com^$image", "  ! indented"],
        );
        assert_eq!(report.stats.comments, 3);
        assert_eq!(report.stats.rules, 0);
        assert!(report.is_clean());
        assert!(index.is_empty());
        assert!(!index.contains_token("comment"));
    }

    #[test]
    fn cosmetic_rules_are_skipped() {
        let (index, report) = build_index_with_report(
            &RuleCompiler::default(),
            ["example.com##.banner", "##div.ad$script", "ads$script"],
        );
        assert_eq!(report.stats.cosmetic, 2);
        assert_eq!(report.stats.rules, 1);
        assert!(!index.contains_token("banner"));
        assert!(!index.contains_token("div"));
        assert_eq!(index.rule_count(), 1);
    }

    #[test]
    fn bad_lines_are_reported_and_the_build_continues() {
        let lines = ["ads$script", "bad$nonsense", "a$b$c", "", "track$image"];
        let (index, report) = build_index_with_report(&RuleCompiler::default(), lines);

        assert_eq!(report.stats.lines, 5);
        assert_eq!(report.stats.rules, 2);
        assert_eq!(report.stats.blank, 1);
        assert_eq!(report.stats.errors, 2);
        assert_eq!(report.errors[0].line_number, 2);
        assert_eq!(
            report.errors[0].error,
            SyntaxError::UnknownOption("nonsense".into())
        );
        assert_eq!(report.errors[1].line_number, 3);
        assert_eq!(report.errors[1].line, "a$b$c");

        // A failed line indexes nothing, not even the previous rule
        assert_eq!(index.bucket("ads").len(), 1);
        assert!(index.bucket("bad").is_empty());
        assert!(index.query("http://x.com/track", Some(ElementTypes::IMAGE)).is_some());
    }

    #[test]
    fn closure_sinks_receive_errors() {
        let mut seen = Vec::new();
        let mut sink = FnSink(|e: LineError| seen.push(e.line_number));
        build_index(["ok$script", "nope", "ok2$nope"], &mut sink);
        assert_eq!(seen, vec![2, 3]);
    }

    #[test]
    fn bare_patterns_with_config() {
        let compiler = RuleCompiler::with_config(CompilerConfig {
            allow_bare_patterns: true,
        });
        let (index, report) = build_index_with_report(&compiler, ["/banner/ads/", "||tracker.io^"]);
        assert!(report.is_clean());
        assert!(index.query("http://x.com/banner/ads/1.gif", None).is_some());
        assert!(index.query("https://tracker.io/p", None).is_some());
    }

    #[test]
    fn unindexable_rules_are_counted() {
        let (_, report) = build_index_with_report(&RuleCompiler::default(), ["/ad/$script"]);
        assert_eq!(report.stats.rules, 1);
        assert_eq!(report.stats.unindexed, 1);
        assert_eq!(report.stats.tokens, 0);
    }

    #[test]
    fn domain_options_through_the_index() {
        let mut errors: Vec<LineError> = Vec::new();
        let index = build_index(
            ["/ads/only$domain=example.com", "/ads/not$domain=~example.com"],
            &mut errors,
        );
        assert!(errors.is_empty());

        assert!(index.query("http://example.com/ads/only", None).is_some());
        assert!(index.query("http://other.com/ads/only", None).is_none());
        assert!(index.query("http://example.com/ads/not", None).is_none());
        assert!(index.query("http://other.com/ads/not", None).is_some());
    }

    #[test]
    fn host_anchor_through_the_index() {
        let index = build_index(["||ads.example.com^$script"], &mut IgnoreErrors);
        let matcher = Matcher::with_host_parser(&index, &FastHostParser);
        let types = Some(ElementTypes::SCRIPT);

        assert!(matcher.is_blocked("http://ads.example.com/x", types));
        assert!(matcher.is_blocked("https://ads.example.com:8080/y", types));
        assert!(!matcher.is_blocked("http://notads.example.com/x", types));
        assert!(!matcher.is_blocked("http://ads.example.com/x", Some(ElementTypes::IMAGE)));
    }

    #[test]
    fn wildcard_rule_through_the_index() {
        let index = build_index(["*ads*$image", "/track/*$script"], &mut IgnoreErrors);
        let m = Matcher::new(&index)
            .query("http://x.com/track/ads/banner.gif", Some(ElementTypes::IMAGE))
            .expect("should match");
        assert_eq!(m.rule.pattern(), "*ads*");
        assert_eq!(m.token, "ads");
    }

    #[test]
    fn concurrent_queries_share_one_index() {
        let index = Arc::new(build_index(
            ["||doubleclick.net^$third-party", "image.png$~image", "/banner/$domain=x.com"],
            &mut IgnoreErrors,
        ));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let index = Arc::clone(&index);
                scope.spawn(move || {
                    for _ in 0..100 {
                        assert!(index.query("http://doubleclick.net/ad", None).is_some());
                        assert!(index
                            .query("http://x.com/image.png", Some(ElementTypes::IMAGE))
                            .is_none());
                        assert!(index.query("http://x.com/banner/1", None).is_some());
                        assert!(index.query("http://y.com/banner/1", None).is_none());
                    }
                });
            }
        });
    }
}
