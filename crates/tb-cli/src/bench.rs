use std::time::Instant;

use tb_core::PatternMatcher;

pub struct BenchOptions {
    pub urls: Vec<String>,
    pub iterations: usize,
    /// Fail when p99 latency exceeds this many microseconds
    pub budget_p99_us: Option<f64>,
}

const WARMUP_ROUNDS: usize = 1000;

/// Used when no URL file is given: a mix of tracker and first-party requests.
pub const SAMPLE_URLS: &[&str] = &[
    "https://www.google-analytics.com/analytics.js",
    "https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js",
    "https://ad.doubleclick.net/pixel.gif",
    "https://connect.facebook.net/en_US/fbevents.js",
    "https://example.com/style.css",
    "https://cdn.example.com/image.png",
    "https://api.example.com/data.json",
    "https://www.wikipedia.org/",
];

pub fn run_bench(matcher: &PatternMatcher, opts: &BenchOptions) -> Result<(), String> {
    if opts.urls.is_empty() {
        return Err("No URLs to benchmark".to_string());
    }
    if opts.iterations == 0 {
        return Err("Iterations must be at least 1".to_string());
    }

    println!("Match Latency Benchmark");
    println!("==================================================");
    println!("  Patterns:    {}", matcher.len());
    println!("  URLs:        {}", opts.urls.len());
    println!("  Iterations:  {}", opts.iterations);

    for url in opts.urls.iter().cycle().take(WARMUP_ROUNDS) {
        let _ = matcher.matches(url);
    }

    let blocked = opts.urls.iter().filter(|url| matcher.matches(url)).count();

    let total_start = Instant::now();
    let latencies = measure_match_latency(matcher, &opts.urls, opts.iterations);
    let total_secs = total_start.elapsed().as_secs_f64();

    let p50 = percentile(&latencies, 0.50);
    let p90 = percentile(&latencies, 0.90);
    let p99 = percentile(&latencies, 0.99);
    let max = latencies.last().copied().unwrap_or(0.0);
    let throughput = if total_secs > 0.0 {
        latencies.len() as f64 / total_secs
    } else {
        0.0
    };

    println!();
    println!("Results");
    println!("--------------------------------------------------");
    println!("  Blocked:     {} / {}", blocked, opts.urls.len());
    println!("  p50:         {:.2} μs", p50);
    println!("  p90:         {:.2} μs", p90);
    println!("  p99:         {:.2} μs", p99);
    println!("  max:         {:.2} μs", max);
    println!("  Throughput:  {:.0} matches/s", throughput);

    match opts.budget_p99_us {
        Some(limit) if !report_budget("Match P99 Latency", p99, limit, "μs") => {
            Err("Performance budget exceeded".to_string())
        }
        _ => Ok(()),
    }
}

fn report_budget(name: &str, actual: f64, limit: f64, unit: &str) -> bool {
    let passed = actual <= limit;
    let status = if passed { "✓" } else { "✗" };
    println!();
    println!("{} {}: {:.2} {} (limit: {:.2} {})", status, name, actual, unit, limit, unit);
    passed
}

fn measure_match_latency(matcher: &PatternMatcher, urls: &[String], iterations: usize) -> Vec<f64> {
    let mut latencies = Vec::with_capacity(urls.len() * iterations);

    for _ in 0..iterations {
        for url in urls {
            let start = Instant::now();
            let _ = matcher.matches(url);
            latencies.push(start.elapsed().as_secs_f64() * 1_000_000.0);
        }
    }

    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    latencies
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}
