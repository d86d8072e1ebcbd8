//! TrackBlock CLI
//!
//! CLI tool for checking URLs against tracker lists and measuring the matcher.

mod bench;
mod source;

use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use tb_core::{InitSummary, MatcherStats, PatternMatcher};
use tb_lists::ListStats;

use crate::bench::{run_bench, BenchOptions, SAMPLE_URLS};
use crate::source::{load_config, load_rules, read_url_file};

#[derive(Parser)]
#[command(name = "tb-cli")]
#[command(about = "TrackBlock tracker list matcher and tools")]
struct Cli {
    /// Log rule loading details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ListArgs {
    /// Filter list files (EasyList or hosts format)
    #[arg(short, long)]
    list: Vec<String>,

    /// Filter list URLs to download
    #[arg(long)]
    list_url: Vec<String>,

    /// JSON matcher configuration
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print BLOCK or ALLOW for each URL
    Check {
        #[command(flatten)]
        lists: ListArgs,

        /// URLs to check
        urls: Vec<String>,

        /// File with one URL per line
        #[arg(short, long)]
        urls_file: Option<String>,
    },

    /// Load lists and print matcher statistics
    Stats {
        #[command(flatten)]
        lists: ListArgs,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Measure match latency percentiles
    Bench {
        #[command(flatten)]
        lists: ListArgs,

        /// File with one URL per line (defaults to a built-in sample)
        #[arg(short, long)]
        urls_file: Option<String>,

        /// Passes over the URL set
        #[arg(short, long, default_value_t = 1000)]
        iterations: usize,

        /// Fail if p99 latency exceeds this many microseconds
        #[arg(long)]
        budget_p99_us: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Check {
            lists,
            urls,
            urls_file,
        } => cmd_check(&lists, urls, urls_file.as_deref()),
        Commands::Stats { lists, json } => cmd_stats(&lists, json),
        Commands::Bench {
            lists,
            urls_file,
            iterations,
            budget_p99_us,
        } => cmd_bench(&lists, urls_file.as_deref(), iterations, budget_p99_us),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

struct LoadedMatcher {
    matcher: PatternMatcher,
    list_stats: ListStats,
    summary: InitSummary,
    sources: usize,
    load_ms: f64,
}

fn build_matcher(args: &ListArgs) -> Result<LoadedMatcher, String> {
    let start = Instant::now();

    let config = load_config(args.config.as_deref())?;
    let loaded = load_rules(&args.list, &args.list_url)?;

    let mut matcher = PatternMatcher::with_config(config).map_err(|e| format!("Invalid config: {}", e))?;
    let summary = matcher.initialize(&loaded.rules);

    Ok(LoadedMatcher {
        matcher,
        list_stats: loaded.stats,
        summary,
        sources: loaded.sources,
        load_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

fn cmd_check(args: &ListArgs, mut urls: Vec<String>, urls_file: Option<&str>) -> Result<(), String> {
    if let Some(path) = urls_file {
        urls.extend(read_url_file(path)?);
    }
    if urls.is_empty() {
        return Err("No URLs specified".to_string());
    }

    let loaded = build_matcher(args)?;

    let mut blocked = 0usize;
    for url in &urls {
        match loaded.matcher.find_match(url) {
            Some(pattern) => {
                blocked += 1;
                println!("BLOCK  {}  ({})", url, pattern.original());
            }
            None => println!("ALLOW  {}", url),
        }
    }

    println!();
    println!("{} of {} URL(s) blocked", blocked, urls.len());

    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    sources: usize,
    list_lines: usize,
    list_rules: usize,
    list_skipped: usize,
    list_duplicates: usize,
    hosts_converted: usize,
    load_ms: f64,
    initialize: InitSummary,
    matcher: MatcherStats,
}

fn cmd_stats(args: &ListArgs, json: bool) -> Result<(), String> {
    let loaded = build_matcher(args)?;
    let stats = loaded.matcher.stats();

    if json {
        let report = StatsReport {
            sources: loaded.sources,
            list_lines: loaded.list_stats.lines,
            list_rules: loaded.list_stats.accepted,
            list_skipped: loaded.list_stats.skipped(),
            list_duplicates: loaded.list_stats.duplicates,
            hosts_converted: loaded.list_stats.hosts_converted,
            load_ms: loaded.load_ms,
            initialize: loaded.summary,
            matcher: stats,
        };
        let text = serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to encode stats: {}", e))?;
        println!("{text}");
        return Ok(());
    }

    let list = &loaded.list_stats;
    println!("Lists: {} source(s)", loaded.sources);
    println!("  Lines:       {}", list.lines);
    println!("  Rules:       {}", list.accepted);
    println!(
        "  Skipped:     {} (comments {}, cosmetic {}, exceptions {}, options {}, regex {}, duplicates {})",
        list.skipped(),
        list.comments,
        list.cosmetic,
        list.exceptions,
        list.with_options,
        list.regex,
        list.duplicates
    );
    println!("  Hosts:       {} converted", list.hosts_converted);
    println!();
    println!("Matcher:");
    println!(
        "  Initialize:  {} added, {} skipped, {} dropped",
        loaded.summary.added, loaded.summary.skipped, loaded.summary.dropped
    );
    println!("  Patterns:    {}", stats.pattern_count);
    println!("  Domains:     {}", stats.domain_count);
    println!("  Generic:     {}", stats.generic_count);
    println!(
        "  Bloom:       {} bits, k={}, fill {:.4}%, est. FP rate {:.2e}",
        stats.bloom_filter_size_bits,
        stats.hash_function_count,
        stats.bloom_filter_fill_ratio * 100.0,
        stats.estimated_false_positive_rate
    );
    println!("  Load time:   {:.1}ms", loaded.load_ms);

    Ok(())
}

fn cmd_bench(
    args: &ListArgs,
    urls_file: Option<&str>,
    iterations: usize,
    budget_p99_us: Option<f64>,
) -> Result<(), String> {
    let urls = match urls_file {
        Some(path) => read_url_file(path)?,
        None => SAMPLE_URLS.iter().map(|s| s.to_string()).collect(),
    };

    let loaded = build_matcher(args)?;
    println!("Loaded {} pattern(s) in {:.1}ms", loaded.matcher.len(), loaded.load_ms);
    println!();

    run_bench(
        &loaded.matcher,
        &BenchOptions {
            urls,
            iterations,
            budget_p99_us,
        },
    )
}
