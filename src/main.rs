//! Image-Harvester main entry point
//!
//! This is the command-line interface for the Image-Harvester gallery crawler.

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::Parser;
use image_harvester::config::{load_config_with_hash, validate, Config};
use image_harvester::crawler::Coordinator;
use image_harvester::output::{print_summary, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Image-Harvester: a lazy-load image gallery crawler
///
/// Image-Harvester crawls outward from a seed page, collects the deferred
/// `data-src` image sources of every page it finds, and downloads each image
/// into `<out>/imgs`. Every success and failure is appended to a run log in
/// `<out>/log`.
#[derive(Parser, Debug)]
#[command(name = "image-harvester")]
#[command(version)]
#[command(about = "A lazy-load image gallery crawler", long_about = None)]
struct Cli {
    /// Seed page to start crawling from [default: https://unsplash.com]
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output directory [default: downloaded]
    #[arg(long, value_name = "DIR")]
    out: Option<String>,

    /// Follow discovered links recursively (`--sub`, `--sub true`, `--sub false`)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    sub: Option<bool>,

    /// Path to an optional TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Deepest link distance from the seed that is still expanded
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Stop discovering pages once this many URLs are known
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Repair non-HTTP links by appending them to the page URL
    #[arg(long)]
    legacy_url_repair: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Exit with status 2 when any page, image source or download failed
    #[arg(long)]
    strict: bool,

    /// Validate the configuration and print it without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (config, config_hash) = effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, config_hash.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let mut coordinator = Coordinator::new(config).context("Failed to prepare the run")?;
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }

    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after in-flight work is aborted");
            cancel.cancel();
        }
    });

    let summary = coordinator.run().await;

    if !cli.quiet {
        print_summary(&summary);
        println!("Run log: {}", coordinator.layout().log_file.display());
    }

    Ok(ExitCode::from(exit_status(&summary, cli.strict)))
}

/// Loads the optional config file and applies command-line overrides
fn effective_config(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(url) = &cli.url {
        config.crawl.seed_url = url.clone();
    }
    if let Some(out) = &cli.out {
        config.output.out_dir = out.clone();
    }
    if let Some(sub) = cli.sub {
        config.crawl.recurse = sub;
    }
    if cli.max_depth.is_some() {
        config.crawl.max_depth = cli.max_depth;
    }
    if cli.max_pages.is_some() {
        config.crawl.max_pages = cli.max_pages;
    }
    if cli.legacy_url_repair {
        config.crawl.legacy_url_repair = true;
    }

    validate(&config).context("Invalid configuration")?;

    Ok((config, hash))
}

/// 130 when interrupted, 2 for failures under `--strict`, otherwise 0
fn exit_status(summary: &RunSummary, strict: bool) -> u8 {
    if summary.cancelled {
        130
    } else if strict && summary.has_failures() {
        2
    } else {
        0
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("image_harvester=info,warn"),
            1 => EnvFilter::new("image_harvester=debug,info"),
            2 => EnvFilter::new("image_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, config_hash: Option<&str>) {
    println!("=== Image-Harvester Dry Run ===\n");

    if let Some(hash) = config_hash {
        println!("Config hash: {}\n", hash);
    }

    println!("Crawl:");
    println!("  Seed URL: {}", config.crawl.seed_url);
    println!("  Recurse: {}", config.crawl.recurse);
    match config.crawl.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unlimited"),
    }
    match config.crawl.max_pages {
        Some(pages) => println!("  Max pages: {}", pages),
        None => println!("  Max pages: unlimited"),
    }
    println!("  Legacy URL repair: {}", config.crawl.legacy_url_repair);
    println!("  Lazy source attribute: {}", config.crawl.lazy_src_attribute);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Max redirects: {}", config.http.max_redirects);

    println!("\nConcurrency:");
    println!(
        "  Max concurrent pages: {}",
        config.concurrency.max_concurrent_pages
    );
    println!(
        "  Max concurrent downloads: {}",
        config.concurrency.max_concurrent_downloads
    );

    println!("\nOutput:");
    println!("  Images: {}/imgs", config.output.out_dir);
    println!("  Logs: {}/log", config.output.out_dir);

    println!("\n✓ Configuration is valid");
}
