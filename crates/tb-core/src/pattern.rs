//! Rule compilation
//!
//! Turns one raw rule string into a [`CompiledPattern`]. Every scan here is a
//! single forward pass over the rule text; no regex engine is involved.
//!
//! Three dialects are recognized:
//!
//! - EasyList host anchors: `||ads.example.com^`
//! - URL globs with a domain segment: `*://*.doubleclick.net/*`, `||example.com/ads/*`
//! - anything else, matched as a plain substring of the URL

use crate::hash::{hash_key, Hash64};

/// Which dialect a rule was compiled as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// `||domain^` host anchor
    Domain,
    /// Wildcard glob with a recognizable domain segment
    Url,
    /// No domain; substring match against the whole URL
    Generic,
}

bitflags::bitflags! {
    /// Syntax features seen while compiling a rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatternShape: u8 {
        /// Rule starts with `||`
        const HOST_ANCHOR = 1 << 0;
        /// Rule starts with `*://`
        const SCHEME_WILDCARD = 1 << 1;
        /// Domain segment started with `*.`
        const SUBDOMAIN_WILDCARD = 1 << 2;
        /// Nothing follows the domain but `^`
        const SEPARATOR_END = 1 << 3;
        /// Nothing follows the domain but `/*`
        const PATH_WILDCARD_END = 1 << 4;
    }
}

impl PatternShape {
    /// `||d^`, `*://d/*` and `*://*.d/*` only constrain the domain.
    #[inline]
    pub fn is_domain_only(self) -> bool {
        self.contains(Self::HOST_ANCHOR | Self::SEPARATOR_END)
            || self.contains(Self::SCHEME_WILDCARD | Self::PATH_WILDCARD_END)
    }
}

/// A compiled rule. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    original: String,
    kind: PatternKind,
    domain: Option<String>,
    path_prefix: Option<String>,
    needle: String,
    shape: PatternShape,
    hash: Hash64,
}

impl CompiledPattern {
    /// The rule text this pattern was compiled from.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Lowercase anchor domain, without a leading `*.`.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Literal path text that must also appear in the URL.
    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    /// Lowercase literal text with wildcard characters removed.
    ///
    /// For `Generic` rules this is the whole rule; for `Url` rules it is the
    /// part after the first `*` following the domain segment.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn shape(&self) -> PatternShape {
        self.shape
    }

    /// Digest of the domain if present, else of the original text.
    pub fn hash(&self) -> Hash64 {
        self.hash
    }

    /// Verify this pattern against an already-lowercased URL.
    ///
    /// Only substring and boundary checks are used.
    pub fn matches_url(&self, url: &str) -> bool {
        match self.kind {
            PatternKind::Domain => match &self.domain {
                Some(domain) => contains_domain(url, domain),
                None => false,
            },
            PatternKind::Url => {
                let Some(domain) = &self.domain else {
                    return false;
                };
                if self.shape.is_domain_only() {
                    return contains_domain(url, domain);
                }
                // The path prefix must follow the host directly; the needle
                // may appear anywhere after it.
                host_occurrences(url, domain).any(|hit| {
                    let rest = match &self.path_prefix {
                        Some(prefix) => match hit.strip_prefix(url, prefix) {
                            Some(rest) => rest,
                            None => return false,
                        },
                        None => &url[hit.domain_end..],
                    };
                    self.needle.is_empty() || rest.contains(self.needle.as_str())
                })
            }
            // An empty needle would match every URL.
            PatternKind::Generic => !self.needle.is_empty() && url.contains(self.needle.as_str()),
        }
    }
}

/// Compile one rule. Total over any input; length limits are enforced by the
/// matcher before this is called.
pub fn compile(raw: &str) -> CompiledPattern {
    let lower = raw.to_ascii_lowercase();

    if let Some((domain, wildcard)) = parse_host_anchor(&lower) {
        let mut shape = PatternShape::HOST_ANCHOR | PatternShape::SEPARATOR_END;
        shape.set(PatternShape::SUBDOMAIN_WILDCARD, wildcard);
        let hash = hash_key(&domain);
        return CompiledPattern {
            original: raw.to_string(),
            kind: PatternKind::Domain,
            domain: Some(domain),
            path_prefix: None,
            needle: String::new(),
            shape,
            hash,
        };
    }

    if let Some(segment) = scan_domain_segment(&lower) {
        let rest = &lower[segment.end..];
        let (head, tail) = match rest.find('*') {
            Some(star) => (&rest[..star], &rest[star + 1..]),
            None => (rest, ""),
        };

        let mut shape = segment.shape;
        shape.set(PatternShape::SEPARATOR_END, rest == "^");
        shape.set(PatternShape::PATH_WILDCARD_END, rest == "/*");

        let hash = hash_key(&segment.domain);
        return CompiledPattern {
            original: raw.to_string(),
            kind: PatternKind::Url,
            domain: Some(segment.domain),
            path_prefix: literal_fragment(head.trim_end_matches(['^', '|'])),
            needle: literal_fragment(&strip_wildcards(tail)).unwrap_or_default(),
            shape,
            hash,
        };
    }

    let mut shape = PatternShape::empty();
    shape.set(PatternShape::HOST_ANCHOR, lower.starts_with("||"));
    shape.set(PatternShape::SCHEME_WILDCARD, lower.starts_with("*://"));

    CompiledPattern {
        original: raw.to_string(),
        kind: PatternKind::Generic,
        domain: None,
        path_prefix: None,
        needle: strip_wildcards(&lower),
        shape,
        hash: hash_key(raw),
    }
}

/// Characters allowed in a domain segment, `*` included.
#[inline]
fn is_segment_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'*'
}

/// `||body^` where body is only domain characters. Returns the normalized
/// domain and whether a leading `*.` was stripped.
fn parse_host_anchor(rule: &str) -> Option<(String, bool)> {
    let body = rule.strip_prefix("||")?.strip_suffix('^')?;
    if body.is_empty() || !body.bytes().all(is_segment_byte) {
        return None;
    }
    normalize_segment(body)
}

struct DomainSegment {
    domain: String,
    /// Byte offset just past the scanned run
    end: usize,
    shape: PatternShape,
}

/// Find the bounded run of domain characters after `||` or `://`.
fn scan_domain_segment(rule: &str) -> Option<DomainSegment> {
    let (start, mut shape) = if rule.starts_with("||") {
        (2, PatternShape::HOST_ANCHOR)
    } else {
        let sep = rule.find("://")?;
        let shape = if &rule[..sep] == "*" {
            PatternShape::SCHEME_WILDCARD
        } else {
            PatternShape::empty()
        };
        (sep + 3, shape)
    };

    let run_len = rule.as_bytes()[start..]
        .iter()
        .take_while(|&&b| is_segment_byte(b))
        .count();
    let end = start + run_len;

    let (domain, wildcard) = normalize_segment(&rule[start..end])?;
    shape.set(PatternShape::SUBDOMAIN_WILDCARD, wildcard);

    Some(DomainSegment { domain, end, shape })
}

/// Strip a leading `*.` and surrounding dots. Runs made only of wildcard
/// characters, or with a `*` left inside the domain, are not indexable.
fn normalize_segment(run: &str) -> Option<(String, bool)> {
    if run.bytes().all(|b| b == b'*' || b == b'.') {
        return None;
    }

    let (rest, wildcard) = match run.strip_prefix("*.") {
        Some(rest) => (rest, true),
        None => (run, false),
    };
    let domain = rest.trim_matches('.');

    if domain.is_empty() || domain.contains('*') {
        return None;
    }

    Some((domain.to_string(), wildcard))
}

/// Drop `*`, `|` and `^`; what remains is matched literally.
fn strip_wildcards(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '*' | '|' | '^')).collect()
}

/// A fragment that carries information beyond "any path".
fn literal_fragment(text: &str) -> Option<String> {
    if text.is_empty() || text == "/" {
        None
    } else {
        Some(text.to_string())
    }
}

/// Does `domain` occur in `url` as a whole host, or as the tail of one?
///
/// An occurrence counts when it follows `//`, `.` or `@` and ends the
/// authority: an optional root `.` and `:port` may come next, then the end
/// of the URL, `/`, `?` or `#`.
pub fn contains_domain(url: &str, domain: &str) -> bool {
    host_occurrences(url, domain).next().is_some()
}

/// Offsets of one accepted domain occurrence.
#[derive(Debug, Clone, Copy)]
struct HostHit {
    /// Just past the domain text
    domain_end: usize,
    /// Just past the root dot and port, where the path begins
    authority_end: usize,
}

impl HostHit {
    /// Text following `prefix` when the URL continues with it, checked both
    /// right after the domain (`:8080/x` style rules) and after the authority.
    fn strip_prefix<'u>(self, url: &'u str, prefix: &str) -> Option<&'u str> {
        url[self.domain_end..]
            .strip_prefix(prefix)
            .or_else(|| url[self.authority_end..].strip_prefix(prefix))
    }
}

fn host_occurrences<'a>(url: &'a str, domain: &'a str) -> impl Iterator<Item = HostHit> + 'a {
    let bytes = url.as_bytes();
    let mut from = 0;

    // Overlapping search: "aa.aa" must be found at both offsets of "//aa.aa.aa/".
    std::iter::from_fn(move || {
        if domain.is_empty() {
            return None;
        }
        while let Some(found) = url[from..].find(domain) {
            let pos = from + found;
            // `find` returns char boundaries; step past the first char of the hit.
            from = pos + url[pos..].chars().next().map_or(1, char::len_utf8);

            let before = (pos >= 2 && &bytes[pos - 2..pos] == b"//")
                || (pos >= 1 && matches!(bytes[pos - 1], b'.' | b'@'));
            if !before {
                continue;
            }

            let domain_end = pos + domain.len();
            if let Some(authority_end) = authority_end(bytes, domain_end) {
                return Some(HostHit {
                    domain_end,
                    authority_end,
                });
            }
        }
        None
    })
}

/// Skip a root `.` and a `:port` after a host. `Some` with the path offset
/// when the authority ends there.
fn authority_end(bytes: &[u8], mut at: usize) -> Option<usize> {
    if bytes.get(at) == Some(&b'.') {
        at += 1;
    }
    if bytes.get(at) == Some(&b':') {
        at += 1;
        at += bytes[at..].iter().take_while(|b| b.is_ascii_digit()).count();
    }
    match bytes.get(at) {
        None | Some(b'/' | b'?' | b'#') => Some(at),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_host_anchor() {
        let p = compile("||google-analytics.com^");
        assert_eq!(p.kind(), PatternKind::Domain);
        assert_eq!(p.domain(), Some("google-analytics.com"));
        assert_eq!(p.path_prefix(), None);
        assert_eq!(p.hash(), hash_key("google-analytics.com"));
        assert!(p.shape().is_domain_only());
    }

    #[test]
    fn host_anchor_is_lowercased_and_wildcard_stripped() {
        let p = compile("||*.Ads.Example.COM^");
        assert_eq!(p.kind(), PatternKind::Domain);
        assert_eq!(p.domain(), Some("ads.example.com"));
        assert!(p.shape().contains(PatternShape::SUBDOMAIN_WILDCARD));
        assert_eq!(p.original(), "||*.Ads.Example.COM^");
    }

    #[test]
    fn compiles_scheme_glob() {
        let p = compile("*://*.doubleclick.net/*");
        assert_eq!(p.kind(), PatternKind::Url);
        assert_eq!(p.domain(), Some("doubleclick.net"));
        assert_eq!(p.path_prefix(), None);
        assert_eq!(p.needle(), "");
        assert!(p.shape().contains(PatternShape::SCHEME_WILDCARD));
        assert!(p.shape().contains(PatternShape::SUBDOMAIN_WILDCARD));
        assert!(p.shape().is_domain_only());
    }

    #[test]
    fn extracts_path_prefix() {
        let p = compile("||example.com/ads/*");
        assert_eq!(p.kind(), PatternKind::Url);
        assert_eq!(p.domain(), Some("example.com"));
        assert_eq!(p.path_prefix(), Some("/ads/"));
        assert!(!p.shape().is_domain_only());
    }

    #[test]
    fn path_prefix_stops_at_separator() {
        let p = compile("||tracker.com/pixel.gif^");
        assert_eq!(p.path_prefix(), Some("/pixel.gif"));
    }

    #[test]
    fn keeps_text_after_first_star_as_needle() {
        let p = compile("*://cdn.example.com/js/*/beacon.js");
        assert_eq!(p.path_prefix(), Some("/js/"));
        assert_eq!(p.needle(), "/beacon.js");
    }

    #[test]
    fn literal_scheme_glob_has_domain() {
        let p = compile("https://metrics.example.org/collect");
        assert_eq!(p.kind(), PatternKind::Url);
        assert_eq!(p.domain(), Some("metrics.example.org"));
        assert_eq!(p.path_prefix(), Some("/collect"));
        assert!(!p.shape().contains(PatternShape::SCHEME_WILDCARD));
    }

    #[test]
    fn plain_text_is_generic() {
        let p = compile("/analytics.js");
        assert_eq!(p.kind(), PatternKind::Generic);
        assert_eq!(p.domain(), None);
        assert_eq!(p.needle(), "/analytics.js");
        assert_eq!(p.hash(), hash_key("/analytics.js"));
    }

    #[test]
    fn wildcard_only_rules_are_generic() {
        for raw in ["*", "**", "||*^", "*://*/*", "||*.*^"] {
            let p = compile(raw);
            assert_eq!(p.kind(), PatternKind::Generic, "{raw}");
            assert_eq!(p.domain(), None, "{raw}");
        }
    }

    #[test]
    fn interior_star_in_domain_is_not_indexed() {
        let p = compile("||ads*.example.com^");
        assert_eq!(p.kind(), PatternKind::Generic);
        assert_eq!(p.domain(), None);
    }

    #[test]
    fn anchor_with_path_falls_back_to_glob() {
        let p = compile("||example.com/banner^");
        assert_eq!(p.kind(), PatternKind::Url);
        assert_eq!(p.path_prefix(), Some("/banner"));
    }

    #[test]
    fn contains_domain_respects_boundaries() {
        assert!(contains_domain("https://example.com/x", "example.com"));
        assert!(contains_domain("https://example.com", "example.com"));
        assert!(contains_domain("https://example.com:8443/", "example.com"));
        assert!(contains_domain("https://a.b.example.com?q", "example.com"));
        assert!(contains_domain("https://user@example.com/", "example.com"));
        assert!(!contains_domain("https://notexample.com/x", "example.com"));
        assert!(!contains_domain("https://example.com.evil.net/x", "example.com"));
        assert!(!contains_domain("https://example.com/x", ""));
    }

    #[test]
    fn contains_domain_accepts_root_dot() {
        assert!(contains_domain("https://www.google-analytics.com./collect", "google-analytics.com"));
        assert!(contains_domain("https://google-analytics.com.", "google-analytics.com"));
        assert!(contains_domain("https://google-analytics.com.:443/x", "google-analytics.com"));
        assert!(!contains_domain("https://google-analytics.com.evil.net/", "google-analytics.com"));
    }

    #[test]
    fn contains_domain_rejects_userinfo_lookalike() {
        assert!(!contains_domain("https://tracker.com:pw@safe.org/", "tracker.com"));
        assert!(!contains_domain("https://tracker.com:80@safe.org/", "tracker.com"));
    }

    #[test]
    fn contains_domain_finds_overlapping_hit() {
        assert!(contains_domain("https://aa.aa.aa/", "aa.aa"));
    }

    #[test]
    fn url_pattern_requires_path_prefix() {
        let p = compile("||example.com/ads/*");
        assert!(p.matches_url("https://example.com/ads/banner.js"));
        assert!(!p.matches_url("https://example.com/content/page.html"));
        assert!(!p.matches_url("https://other.com/ads/banner.js"));
    }

    #[test]
    fn url_pattern_path_must_follow_host() {
        let p = compile("||example.com/ads/*");
        assert!(!p.matches_url("https://example.com/content?next=/ads/"));
        assert!(p.matches_url("https://cdn.example.com:8443/ads/x.js"));
        assert!(p.matches_url("https://example.com./ads/x.js"));

        let p = compile("||tracker.com/pixel.gif^");
        assert!(p.matches_url("https://tracker.com/pixel.gif?id=1"));
        assert!(!p.matches_url("https://tracker.com/static/pixel.gif"));
    }

    #[test]
    fn url_pattern_needle_follows_prefix() {
        let p = compile("*://cdn.example.com/js/*/beacon.js");
        assert!(p.matches_url("https://cdn.example.com/js/v2/beacon.js"));
        assert!(!p.matches_url("https://cdn.example.com/beacon.js?from=/js/"));
    }

    #[test]
    fn url_pattern_with_port_in_rule() {
        let p = compile("||example.com:8080/admin");
        assert!(p.matches_url("http://example.com:8080/admin/login"));
        assert!(!p.matches_url("http://example.com/admin"));
    }

    #[test]
    fn generic_pattern_matches_substring() {
        let p = compile("/analytics.js");
        assert!(p.matches_url("https://cdn.example.com/analytics.js"));
        assert!(!p.matches_url("https://cdn.example.com/app.js"));
    }

    #[test]
    fn empty_needle_matches_nothing() {
        let p = compile("**");
        assert!(!p.matches_url("https://example.com/"));
    }

    #[test]
    fn pathological_rule_compiles_quickly() {
        let raw = format!("||{}b^", "a*".repeat(250));
        let p = compile(&raw);
        assert_eq!(p.kind(), PatternKind::Generic);
        let url = format!("https://{}.com/", "a".repeat(4000));
        assert!(!p.matches_url(&url));
    }
}
