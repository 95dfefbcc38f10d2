//! URL helpers: token splitting and hostname extraction
//!
//! Tokens are maximal runs of word characters (ASCII alphanumerics and `_`).
//! Filter patterns and request URLs are split with the same pattern so that a
//! rule is always found under a token the URL can produce.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Tokenization
// =============================================================================

/// Tokens shorter than this are too common to be useful index keys.
pub const MIN_TOKEN_LEN: usize = 3;

static TOKEN_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z_]").expect("token separator pattern is valid"));

/// Split on every non-word character. Empty pieces are kept, like a plain
/// regex split; callers usually want [`significant_tokens`].
pub fn split_tokens(s: &str) -> impl Iterator<Item = &str> {
    TOKEN_SEPARATOR.split(s)
}

/// Tokens long enough to be used as index keys, in occurrence order.
pub fn significant_tokens(s: &str) -> impl Iterator<Item = &str> {
    split_tokens(s).filter(|tok| is_significant(tok))
}

/// Check if a token qualifies as an index key.
#[inline]
pub fn is_significant(token: &str) -> bool {
    token.len() >= MIN_TOKEN_LEN
}

// =============================================================================
// Hostname Extraction
// =============================================================================

/// Hostname-parsing collaborator used by domain-restricted rules.
///
/// Returns `None` when the URL cannot be parsed or has no host. Hosts are
/// returned lowercased.
pub trait HostnameParser: Send + Sync {
    fn hostname<'u>(&self, url: &'u str) -> Option<Cow<'u, str>>;
}

/// WHATWG parsing through the `url` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlHostParser;

impl HostnameParser for UrlHostParser {
    fn hostname<'u>(&self, url: &'u str) -> Option<Cow<'u, str>> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return None;
        }
        Some(Cow::Owned(host.to_ascii_lowercase()))
    }
}

/// Slice scan without allocations for already-lowercase ASCII hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastHostParser;

impl HostnameParser for FastHostParser {
    fn hostname<'u>(&self, url: &'u str) -> Option<Cow<'u, str>> {
        let host = extract_host(url)?;
        if host.is_empty() {
            return None;
        }
        if !host.is_ascii() {
            return normalize_host(host).map(Cow::Owned);
        }
        if host.bytes().any(|b| b.is_ascii_uppercase()) {
            Some(Cow::Owned(host.to_ascii_lowercase()))
        } else {
            Some(Cow::Borrowed(host))
        }
    }
}

/// Map a bare hostname to the form [`UrlHostParser`] reports: IDNA
/// (punycode, lowercase) for domains, canonical text for IP addresses,
/// no brackets around IPv6.
pub fn normalize_host(host: &str) -> Option<String> {
    let parsed = if host.contains(':') {
        url::Host::parse(&format!("[{host}]"))
    } else {
        url::Host::parse(host)
    };
    let host = parsed.ok()?.to_string();
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(&host);
    Some(host.to_string())
}

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();
    let colon_pos = bytes.iter().position(|&b| b == b':')?;

    if bytes.len() > colon_pos + 2 && bytes[colon_pos + 1] == b'/' && bytes[colon_pos + 2] == b'/' {
        return Some(colon_pos + 3);
    }

    None
}

/// Fast host extraction. Returns a slice into the original URL.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    Some(&url[host_start..host_end])
}

/// Get the start and end positions of the hostname in a URL.
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Userinfo ends at the last '@' before the path
    let authority_end = bytes[scheme_end..]
        .iter()
        .position(|&b| b == b'/' || b == b'?' || b == b'#')
        .map_or(bytes.len(), |i| scheme_end + i);
    let host_start = bytes[scheme_end..authority_end]
        .iter()
        .rposition(|&b| b == b'@')
        .map_or(scheme_end, |i| scheme_end + i + 1);

    // Bracketed IPv6 literal
    if bytes.get(host_start) == Some(&b'[') {
        let close = bytes[host_start..authority_end].iter().position(|&b| b == b']')?;
        return Some((host_start + 1, host_start + close));
    }

    let host_end = bytes[host_start..authority_end]
        .iter()
        .position(|&b| b == b':')
        .map_or(authority_end, |i| host_start + i);

    Some((host_start, host_end))
}
