//! Domain patterns: the single matchable rule behind every policy entry.
//!
//! # Pattern Syntax
//!
//! - Exact match: `github.com`
//! - Wildcard match: `*.github.com`, stored as the suffix `.github.com`
//!
//! Only the leading `*` is dropped; the `.` stays part of the suffix so that
//! `*.github.com` cannot match `fakegithub.com`.

/// Marker that introduces a wildcard pattern.
pub const WILDCARD_MARKER: &str = "*.";

/// A single exact-host or wildcard-suffix rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomainPattern {
    /// Host must equal this string exactly.
    Exact(String),
    /// Host must end with this suffix (always starts with `.`).
    WildcardSuffix(String),
}

/// How wildcard suffixes are compared against a candidate host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WildcardMatching {
    /// Plain `ends_with` comparison. `*.github.com` also matches the
    /// degenerate host `.github.com`.
    #[default]
    Suffix,
    /// Requires a non-empty label in front of the suffix, so
    /// `.github.com` and `a..github.com` no longer match.
    LabelBoundary,
}

impl DomainPattern {
    /// Parse a pattern source string (`"*.example.com"` or `"example.com"`).
    ///
    /// No normalization is applied; the string is kept as written.
    pub fn parse(source: &str) -> Self {
        match source.strip_prefix('*') {
            Some(suffix) if source.starts_with(WILDCARD_MARKER) => {
                DomainPattern::WildcardSuffix(suffix.to_string())
            }
            _ => DomainPattern::Exact(source.to_string()),
        }
    }

    /// Check a host against this pattern.
    pub fn matches(&self, host: &str, matching: WildcardMatching) -> bool {
        match self {
            DomainPattern::Exact(exact) => exact == host,
            DomainPattern::WildcardSuffix(suffix) => matches_suffix(suffix, host, matching),
        }
    }
}

/// Check if a host ends with a stored wildcard suffix.
///
/// Stored suffixes always begin with `.`, so the label separator is part of
/// the comparison. With [`WildcardMatching::LabelBoundary`] the part of the
/// host in front of the suffix must also be a non-empty label.
pub(crate) fn matches_suffix(suffix: &str, host: &str, matching: WildcardMatching) -> bool {
    let Some(prefix) = host.strip_suffix(suffix) else {
        return false;
    };

    match matching {
        WildcardMatching::Suffix => true,
        WildcardMatching::LabelBoundary => !prefix.is_empty() && !prefix.ends_with('.'),
    }
}
