//! Rule and configuration sources: local files and downloaded lists.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tb_core::MatcherConfig;
use tb_lists::{merge_rule_sets, parse_filter_list, ListStats};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

pub struct LoadedRules {
    pub rules: Vec<String>,
    pub stats: ListStats,
    pub sources: usize,
}

pub fn load_rules(paths: &[String], urls: &[String]) -> Result<LoadedRules, String> {
    if paths.is_empty() && urls.is_empty() {
        return Err("No filter lists specified (use --list or --list-url)".to_string());
    }

    let mut texts: Vec<(String, String)> = Vec::with_capacity(paths.len() + urls.len());

    for path in paths {
        let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
        texts.push((path.clone(), content));
    }

    if !urls.is_empty() {
        texts.extend(download_lists(urls)?);
    }

    let mut stats = ListStats::default();
    let mut rule_sets = Vec::with_capacity(texts.len());
    for (name, content) in &texts {
        let parsed = parse_filter_list(content);
        log::info!(
            "{}: {} lines, {} rules, {} skipped",
            display_name(name),
            parsed.stats.lines,
            parsed.stats.accepted,
            parsed.stats.skipped()
        );
        stats.merge(&parsed.stats);
        rule_sets.push(parsed.rules);
    }

    let (rules, cross_list_duplicates) = merge_rule_sets(rule_sets);
    stats.duplicates += cross_list_duplicates;
    stats.accepted = rules.len();

    Ok(LoadedRules {
        rules,
        stats,
        sources: texts.len(),
    })
}

fn download_lists(urls: &[String]) -> Result<Vec<(String, String)>, String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(download_lists_async(urls))
}

async fn download_lists_async(urls: &[String]) -> Result<Vec<(String, String)>, String> {
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let mut tasks = tokio::task::JoinSet::new();
    for (idx, url) in urls.iter().enumerate() {
        let client = client.clone();
        let url = url.clone();
        tasks.spawn(async move {
            let body = fetch_text(&client, &url).await;
            (idx, url, body)
        });
    }

    let mut results: Vec<Option<(String, String)>> = vec![None; urls.len()];
    while let Some(joined) = tasks.join_next().await {
        let (idx, url, body) = joined.map_err(|e| format!("Download task failed: {}", e))?;
        let body = body.map_err(|e| format!("Failed to download '{}': {}", url, e))?;
        log::debug!("Downloaded {} ({} bytes)", url, body.len());
        results[idx] = Some((url, body));
    }

    // Keep command-line order so rule precedence is stable
    Ok(results.into_iter().flatten().collect())
}

async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.text().await
}

pub fn load_config(path: Option<&str>) -> Result<MatcherConfig, String> {
    let Some(path) = path else {
        return Ok(MatcherConfig::default());
    };

    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    let config: MatcherConfig =
        serde_json::from_str(&content).map_err(|e| format!("Invalid config '{}': {}", path, e))?;
    config.validate().map_err(|e| format!("Invalid config '{}': {}", path, e))?;
    Ok(config)
}

/// Read one URL per line, skipping blanks and `#` comments.
pub fn read_url_file(path: &str) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn display_name(source: &str) -> String {
    if source.contains("://") {
        return source.to_string();
    }
    Path::new(source)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, content: &str) -> String {
        let path = std::env::temp_dir().join(format!("tb-cli-{}-{}", std::process::id(), name));
        let mut file = fs::File::create(&path).expect("create temp file");
        file.write_all(content.as_bytes()).expect("write temp file");
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_load_rules_merges_files() {
        let a = temp_file("a.txt", "! list a\n||ads.com^\n||track.io^\n");
        let b = temp_file("b.txt", "0.0.0.0 track.io\n0.0.0.0 pixel.net\n");

        let loaded = load_rules(&[a.clone(), b.clone()], &[]).expect("lists load");
        assert_eq!(loaded.rules, vec!["||ads.com^", "||track.io^", "||pixel.net^"]);
        assert_eq!(loaded.stats.duplicates, 1);
        assert_eq!(loaded.stats.accepted, 3);
        assert_eq!(loaded.sources, 2);

        let _ = fs::remove_file(a);
        let _ = fs::remove_file(b);
    }

    #[test]
    fn test_load_rules_requires_source() {
        assert!(load_rules(&[], &[]).is_err());
        assert!(load_rules(&["/nonexistent/list.txt".to_string()], &[]).is_err());
    }

    #[test]
    fn test_load_config() {
        assert_eq!(load_config(None).expect("default"), MatcherConfig::default());

        let path = temp_file("config.json", r#"{"maxPatterns": 5, "hashFunctionCount": 3}"#);
        let config = load_config(Some(&path)).expect("valid config");
        assert_eq!(config.max_patterns, 5);
        assert_eq!(config.hash_function_count, 3);
        let _ = fs::remove_file(path);

        let path = temp_file("bad.json", r#"{"hashFunctionCount": 0}"#);
        assert!(load_config(Some(&path)).is_err());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_read_url_file() {
        let path = temp_file("urls.txt", "# sample\nhttps://a.com/\n\n  https://b.com/x  \n");
        let urls = read_url_file(&path).expect("readable");
        assert_eq!(urls, vec!["https://a.com/", "https://b.com/x"]);
        let _ = fs::remove_file(path);
    }
}
