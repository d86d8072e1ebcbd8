//! WebAssembly bindings for TrackBlock

use std::sync::Arc;

use tb_core::{InitSummary, MatcherConfig, MatcherObserver, PatternMatcher, RuleError};
use tb_lists::parse_filter_list;
use wasm_bindgen::prelude::*;

/// Routes matcher warnings to the browser console.
struct ConsoleObserver;

impl MatcherObserver for ConsoleObserver {
    fn on_rule_skipped(&self, rule: &str, reason: &RuleError) {
        if matches!(reason, RuleError::Duplicate) {
            return;
        }
        let head: String = rule.chars().take(64).collect();
        web_sys::console::warn_1(&JsValue::from_str(&format!("[trackblock] Skipping rule '{}': {}", head, reason)));
    }

    fn on_capacity_reached(&self, max: usize, dropped: usize) {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "[trackblock] Pattern capacity of {} reached, {} rule(s) dropped",
            max, dropped
        )));
    }

    fn on_initialized(&self, summary: &InitSummary) {
        web_sys::console::info_1(&JsValue::from_str(&format!(
            "[trackblock] Initialized: {} added, {} skipped, {} dropped",
            summary.added, summary.skipped, summary.dropped
        )));
    }
}

#[wasm_bindgen]
pub struct TrackerMatcher {
    inner: PatternMatcher,
}

#[wasm_bindgen]
impl TrackerMatcher {
    /// `config` is an optional object with any of `maxPatterns`,
    /// `bloomFilterSizeBits`, `hashFunctionCount`, `maxPatternLength`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<js_sys::Object>) -> Result<TrackerMatcher, JsValue> {
        let config = match config {
            Some(obj) => read_config(&obj)?,
            None => MatcherConfig::default(),
        };

        let inner = PatternMatcher::with_config(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
            .with_observer(Arc::new(ConsoleObserver));

        Ok(TrackerMatcher { inner })
    }

    /// Load an array of rule strings. Non-string entries are skipped.
    pub fn initialize(&mut self, rules: js_sys::Array) -> JsValue {
        let rules: Vec<String> = rules.iter().filter_map(|value| value.as_string()).collect();
        summary_object(&self.inner.initialize(&rules)).into()
    }

    /// Parse EasyList or hosts-file text and load the resulting rules.
    #[wasm_bindgen(js_name = initializeFromList)]
    pub fn initialize_from_list(&mut self, text: &str) -> JsValue {
        let parsed = parse_filter_list(text);
        let result = summary_object(&self.inner.initialize(&parsed.rules));
        set(&result, "listLines", parsed.stats.lines as f64);
        set(&result, "listSkipped", parsed.stats.skipped() as f64);
        result.into()
    }

    #[wasm_bindgen(js_name = addPattern)]
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        self.inner.add_pattern(pattern)
    }

    #[wasm_bindgen(js_name = removePattern)]
    pub fn remove_pattern(&mut self, pattern: &str) -> bool {
        self.inner.remove_pattern(pattern)
    }

    pub fn matches(&self, url: &str) -> bool {
        self.inner.matches(url)
    }

    /// Text of the rule blocking `url`, or `undefined`.
    #[wasm_bindgen(js_name = findMatch)]
    pub fn find_match(&self, url: &str) -> Option<String> {
        self.inner.find_match(url).map(|p| p.original().to_string())
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> JsValue {
        let stats = self.inner.stats();
        let result = js_sys::Object::new();
        set(&result, "patternCount", stats.pattern_count as f64);
        set(&result, "domainCount", stats.domain_count as f64);
        set(&result, "genericCount", stats.generic_count as f64);
        set(&result, "bloomFilterFillRatio", stats.bloom_filter_fill_ratio);
        set(&result, "estimatedFalsePositiveRate", stats.estimated_false_positive_rate);
        set(&result, "bloomFilterSizeBits", stats.bloom_filter_size_bits as f64);
        set(&result, "hashFunctionCount", stats.hash_function_count as f64);
        set(&result, "initialized", stats.initialized);
        set(&result, "queries", stats.queries as f64);
        set(&result, "blocked", stats.blocked as f64);
        result.into()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn compact(&mut self) {
        self.inner.compact();
    }

    #[wasm_bindgen(js_name = isInitialized)]
    pub fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }
}

fn set(target: &js_sys::Object, key: &str, value: impl Into<JsValue>) {
    let _ = js_sys::Reflect::set(target, &key.into(), &value.into());
}

fn summary_object(summary: &InitSummary) -> js_sys::Object {
    let result = js_sys::Object::new();
    set(&result, "added", summary.added as f64);
    set(&result, "skipped", summary.skipped as f64);
    set(&result, "dropped", summary.dropped as f64);
    result
}

fn read_config(obj: &js_sys::Object) -> Result<MatcherConfig, JsValue> {
    let mut config = MatcherConfig::default();

    if let Some(v) = read_number(obj, "maxPatterns")? {
        config.max_patterns = v as usize;
    }
    if let Some(v) = read_number(obj, "bloomFilterSizeBits")? {
        config.bloom_filter_size_bits = v as usize;
    }
    if let Some(v) = read_number(obj, "hashFunctionCount")? {
        config.hash_function_count = v as u32;
    }
    if let Some(v) = read_number(obj, "maxPatternLength")? {
        config.max_pattern_length = v as usize;
    }

    Ok(config)
}

fn read_number(obj: &js_sys::Object, key: &str) -> Result<Option<f64>, JsValue> {
    let value = js_sys::Reflect::get(obj, &key.into())?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    match value.as_f64() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(Some(n)),
        _ => Err(JsValue::from_str(&format!("Config field '{}' must be a non-negative integer", key))),
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn rules(list: &[&str]) -> js_sys::Array {
        list.iter().map(|r| JsValue::from_str(r)).collect()
    }

    #[wasm_bindgen_test]
    fn test_matches_after_initialize() {
        let mut matcher = TrackerMatcher::new(None).expect("default config");
        assert!(!matcher.matches("https://www.google-analytics.com/collect"));

        matcher.initialize(rules(&["||google-analytics.com^"]));
        assert!(matcher.matches("https://www.google-analytics.com/collect"));
        assert!(!matcher.matches("https://www.google.com/search?q=analytics"));

        assert!(matcher.add_pattern("*://*.doubleclick.net/*"));
        assert_eq!(
            matcher.find_match("https://ad.doubleclick.net/pixel.gif").as_deref(),
            Some("*://*.doubleclick.net/*")
        );

        assert!(matcher.remove_pattern("||google-analytics.com^"));
        assert!(!matcher.matches("https://www.google-analytics.com/collect"));
    }

    #[wasm_bindgen_test]
    fn test_config_object() {
        let obj = js_sys::Object::new();
        set(&obj, "maxPatterns", 2.0);
        let mut matcher = TrackerMatcher::new(Some(obj)).expect("valid config");
        matcher.initialize(rules(&["||a.com^", "||b.com^", "||c.com^"]));

        let stats = matcher.get_stats();
        let count = js_sys::Reflect::get(&stats, &"patternCount".into()).expect("field");
        assert_eq!(count.as_f64(), Some(2.0));

        let bad = js_sys::Object::new();
        set(&bad, "hashFunctionCount", 0.0);
        assert!(TrackerMatcher::new(Some(bad)).is_err());
    }

    #[wasm_bindgen_test]
    fn test_initialize_from_list() {
        let mut matcher = TrackerMatcher::new(None).expect("default config");
        matcher.initialize_from_list("! comment\n0.0.0.0 pixel.tracker.net\n||ads.com^$script\n");
        assert!(matcher.matches("https://pixel.tracker.net/p.gif"));
        assert!(!matcher.matches("https://ads.com/"));

        matcher.clear();
        assert!(!matcher.is_initialized());
    }
}
