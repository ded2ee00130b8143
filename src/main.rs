//! Campus Crawler main entry point
//!
//! This is the command-line interface for the campus-crawler page harvester.

use anyhow::Context;
use campus_crawler::config::{load_config_with_hash, Config};
use campus_crawler::output::{print_statistics, JsonOutput};
use campus_crawler::section::SectionClassifier;
use campus_crawler::{Crawler, HttpFetcher};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Campus Crawler: a polite single-site page harvester
///
/// Campus Crawler walks one institution's website breadth-first while
/// respecting robots.txt and a per-host request delay, extracts the main text
/// of every page, and writes one labelled record per page.
#[derive(Parser, Debug)]
#[command(name = "campus-crawler")]
#[command(version)]
#[command(about = "A polite single-site page harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Write page records here instead of the configured records path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(output) = &cli.output {
        config.output.records_path = output.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("campus_crawler=info,warn"),
            1 => EnvFilter::new("campus_crawler=debug,info"),
            2 => EnvFilter::new("campus_crawler=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Campus Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Retries: {} (backoff from {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!(
        "  Records: {} ({:?})",
        config.output.records_path, config.output.format
    );
    if let Some(failures) = &config.output.failures_path {
        println!("  Failures: {}", failures);
    }

    println!("\nSeed URLs ({}):", config.scope.seed_urls.len());
    for seed in &config.scope.seed_urls {
        println!("  - {}", seed);
    }

    println!(
        "\nAllowed Domains ({}):",
        config.scope.allowed_domains.len()
    );
    for domain in &config.scope.allowed_domains {
        println!("  - {}", domain);
    }

    let classifier = SectionClassifier::from_rules_or_default(&config.section_rules);
    println!("\nSection Rules ({}):", classifier.rules().len());
    for rule in classifier.rules() {
        println!("  - {} -> {}", rule.pattern, rule.label);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.scope.seed_urls.len()
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(&config).context("Failed to build HTTP client")?;
    let mut output = JsonOutput::from_config(&config.output).with_context(|| {
        format!(
            "Failed to open output file {}",
            config.output.records_path
        )
    })?;

    let mut crawler = Crawler::new(config, fetcher);

    // Graceful stop on Ctrl-C: the page in flight finishes, nothing new is fetched
    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current page");
            stop.cancel();
        }
    });

    let stats = crawler.run(&mut output).await.context("Crawl failed")?;

    println!();
    print_statistics(&stats);

    Ok(())
}
