use std::net::IpAddr;

use crate::optimizer::dedupe_rules;

/// Per-category line counts for one parsed list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListStats {
    pub lines: usize,
    pub blank: usize,
    pub comments: usize,
    pub cosmetic: usize,
    pub exceptions: usize,
    pub with_options: usize,
    pub regex: usize,
    /// Hosts-file entries rewritten to `||domain^`
    pub hosts_converted: usize,
    /// Hosts-file entries naming the local machine
    pub hosts_ignored: usize,
    /// Lines with embedded whitespace that are not hosts-file entries, and
    /// hosts-file names that are not valid domains
    pub invalid: usize,
    pub duplicates: usize,
    /// Rules handed to the matcher
    pub accepted: usize,
}

impl ListStats {
    pub fn skipped(&self) -> usize {
        self.comments
            + self.cosmetic
            + self.exceptions
            + self.with_options
            + self.regex
            + self.hosts_ignored
            + self.invalid
            + self.duplicates
    }

    pub fn merge(&mut self, other: &ListStats) {
        self.lines += other.lines;
        self.blank += other.blank;
        self.comments += other.comments;
        self.cosmetic += other.cosmetic;
        self.exceptions += other.exceptions;
        self.with_options += other.with_options;
        self.regex += other.regex;
        self.hosts_converted += other.hosts_converted;
        self.hosts_ignored += other.hosts_ignored;
        self.invalid += other.invalid;
        self.duplicates += other.duplicates;
        self.accepted += other.accepted;
    }
}

/// Rules ready for `PatternMatcher::initialize`, plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedList {
    pub rules: Vec<String>,
    pub stats: ListStats,
}

enum LineKind {
    Blank,
    Comment,
    Cosmetic,
    Exception,
    Options,
    Regex,
    Hosts(HostsEntry),
    HostsLocal,
    Invalid,
    Rule(String),
}

pub fn parse_filter_list(text: &str) -> ParsedList {
    let mut rules = Vec::new();
    let mut stats = ListStats::default();

    for raw_line in text.lines() {
        stats.lines += 1;

        match classify_line(raw_line) {
            LineKind::Blank => stats.blank += 1,
            LineKind::Comment => stats.comments += 1,
            LineKind::Cosmetic => stats.cosmetic += 1,
            LineKind::Exception => stats.exceptions += 1,
            LineKind::Options => stats.with_options += 1,
            LineKind::Regex => stats.regex += 1,
            LineKind::HostsLocal => stats.hosts_ignored += 1,
            LineKind::Invalid => stats.invalid += 1,
            LineKind::Hosts(entry) => {
                stats.hosts_converted += entry.domains.len();
                stats.invalid += entry.rejected;
                rules.extend(entry.domains.into_iter().map(|d| format!("||{d}^")));
            }
            LineKind::Rule(rule) => rules.push(rule),
        }
    }

    stats.duplicates = dedupe_rules(&mut rules);
    stats.accepted = rules.len();

    log::debug!(
        "Parsed filter list: {} lines, {} rules accepted, {} skipped",
        stats.lines,
        stats.accepted,
        stats.skipped()
    );

    ParsedList { rules, stats }
}

fn classify_line(raw_line: &str) -> LineKind {
    let line = raw_line.trim();
    if line.is_empty() {
        return LineKind::Blank;
    }

    if line.contains("##") || line.contains("#@#") || line.contains("#?#") {
        return LineKind::Cosmetic;
    }

    if is_comment_line(line) {
        return LineKind::Comment;
    }

    if line.starts_with("@@") {
        return LineKind::Exception;
    }

    if let Some(entry) = parse_hosts_file_entry(line) {
        return if entry.domains.is_empty() && entry.rejected == 0 {
            LineKind::HostsLocal
        } else {
            LineKind::Hosts(entry)
        };
    }

    if line.split_whitespace().nth(1).is_some() {
        return LineKind::Invalid;
    }

    if line.contains('$') {
        return LineKind::Options;
    }

    if is_regex_rule(line) {
        return LineKind::Regex;
    }

    LineKind::Rule(line.to_string())
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('[') || line.starts_with('#')
}

fn is_regex_rule(line: &str) -> bool {
    line.len() > 1 && line.starts_with('/') && line.ends_with('/')
}

struct HostsEntry {
    domains: Vec<String>,
    /// Names that failed domain validation
    rejected: usize,
}

/// `0.0.0.0 ads.example.com tracker.example.com # note`
///
/// `None` when the line does not start with an IP address. Local names
/// (`localhost`, `broadcasthost`, addresses) are dropped silently, so an
/// entry made only of those yields no domains and no rejections.
fn parse_hosts_file_entry(line: &str) -> Option<HostsEntry> {
    let content = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };

    let mut parts = content.split_whitespace();
    let first = parts.next()?;
    first.parse::<IpAddr>().ok()?;

    let mut entry = HostsEntry {
        domains: Vec::new(),
        rejected: 0,
    };
    for name in parts.filter(|name| !is_local_hostname(name)) {
        match normalize_domain(name) {
            Some(domain) => entry.domains.push(domain),
            None => entry.rejected += 1,
        }
    }

    Some(entry)
}

fn is_local_hostname(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    matches!(
        name.as_str(),
        "localhost" | "localhost.localdomain" | "local" | "broadcasthost"
    ) || name.starts_with("ip6-")
        || name.parse::<IpAddr>().is_ok()
}

fn normalize_domain(host: &str) -> Option<String> {
    let trimmed = host.trim().trim_matches('.');
    if trimmed.is_empty() {
        return None;
    }

    if !trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-')
    {
        return None;
    }

    Some(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_comments_and_headers() {
        let parsed = parse_filter_list("[Adblock Plus 2.0]\n! Title: EasyPrivacy\n# hosts comment\n\n||tracker.com^\n");
        assert_eq!(parsed.rules, vec!["||tracker.com^"]);
        assert_eq!(parsed.stats.comments, 3);
        assert_eq!(parsed.stats.blank, 1);
        assert_eq!(parsed.stats.lines, 5);
    }

    #[test]
    fn test_skips_cosmetic_and_exceptions() {
        let list = "example.com##.ad-banner\n##.sponsored\nexample.com#@#.ad\nexample.com#?#div:has(.ad)\n@@||cdn.example.com^\n";
        let parsed = parse_filter_list(list);
        assert!(parsed.rules.is_empty());
        assert_eq!(parsed.stats.cosmetic, 4);
        assert_eq!(parsed.stats.exceptions, 1);
    }

    #[test]
    fn test_skips_options_and_regex() {
        let parsed = parse_filter_list("||ads.com^$third-party\n/banner\\d+/\n/ad-frame.\n");
        assert_eq!(parsed.rules, vec!["/ad-frame."]);
        assert_eq!(parsed.stats.with_options, 1);
        assert_eq!(parsed.stats.regex, 1);
    }

    #[test]
    fn test_converts_hosts_entries() {
        let list = "127.0.0.1 localhost\n::1 ip6-localhost\n0.0.0.0 0.0.0.0\n0.0.0.0 Ads.Example.com # ad server\n0.0.0.0 a.net b.net\n";
        let parsed = parse_filter_list(list);
        assert_eq!(parsed.rules, vec!["||ads.example.com^", "||a.net^", "||b.net^"]);
        assert_eq!(parsed.stats.hosts_converted, 3);
        assert_eq!(parsed.stats.hosts_ignored, 3);
    }

    #[test]
    fn test_rejects_hosts_names_outside_rule_charset() {
        let parsed = parse_filter_list("0.0.0.0 foo_bar.com\n");
        assert!(parsed.rules.is_empty());
        assert_eq!(parsed.stats.invalid, 1);
        assert_eq!(parsed.stats.hosts_converted, 0);
        assert_eq!(parsed.stats.hosts_ignored, 0);

        let parsed = parse_filter_list("0.0.0.0 ok.net bad_name.net\n");
        assert_eq!(parsed.rules, vec!["||ok.net^"]);
        assert_eq!(parsed.stats.hosts_converted, 1);
        assert_eq!(parsed.stats.invalid, 1);
    }

    #[test]
    fn test_dedupes_across_dialects() {
        let parsed = parse_filter_list("||ads.com^\n0.0.0.0 ads.com\n||ads.com^\n*://*.track.io/*\n");
        assert_eq!(parsed.rules, vec!["||ads.com^", "*://*.track.io/*"]);
        assert_eq!(parsed.stats.duplicates, 2);
        assert_eq!(parsed.stats.accepted, 2);
    }

    #[test]
    fn test_rejects_whitespace_rules() {
        let parsed = parse_filter_list("not a rule\n");
        assert!(parsed.rules.is_empty());
        assert_eq!(parsed.stats.invalid, 1);
        assert_eq!(parsed.stats.skipped(), 1);
    }

    #[test]
    fn test_merge_stats() {
        let a = parse_filter_list("||a.com^\n! c\n").stats;
        let mut total = parse_filter_list("||b.com^\n").stats;
        total.merge(&a);
        assert_eq!(total.lines, 3);
        assert_eq!(total.accepted, 2);
        assert_eq!(total.comments, 1);
    }
}
