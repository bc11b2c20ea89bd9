//! Feed Scotty main entry point
//!
//! This is the command-line interface for Feed Scotty.

use anyhow::Context;
use clap::Parser;
use feed_scotty::config::{load_config_with_hash, Config, COMBINED_FEED_ID};
use feed_scotty::output::{FeedWriter, DEFAULT_OUTPUT_DIR};
use feed_scotty::reconcile::{
    root_url_from_env, with_trailing_slash, FsSnapshotStore, HttpSnapshotStore, SnapshotCache,
};
use feed_scotty::{Batch, HttpEngine};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Feed Scotty: syndication feeds for websites that don't have them
///
/// Feed Scotty scrapes the pages listed in a TOML file with CSS selectors and
/// writes an Atom or RSS feed plus a JSON snapshot per feed. Publication dates
/// of entries seen by a previous run are preserved using that run's snapshots.
#[derive(Parser, Debug)]
#[command(name = "feed-scotty")]
#[command(version)]
#[command(about = "Syndication feeds for websites that don't have them", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", default_value = "feeds.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the feeds without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Directory the feeds are written to
    #[arg(long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Where previous snapshots are read from: a URL or a local directory
    /// (defaults to the CI pages URL)
    #[arg(long, value_name = "URL|DIR", env = "FEED_SCOTTY_SNAPSHOTS")]
    snapshots: Option<String>,

    /// Treat this as an unattended scheduled run (implied by GITHUB_EVENT_NAME=schedule)
    #[arg(long)]
    scheduled: bool,

    /// Number of feeds fetched at the same time
    #[arg(long, value_name = "N", default_value_t = 1)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_run(config, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_scotty=info,warn"),
            1 => EnvFilter::new("feed_scotty=debug,info"),
            2 => EnvFilter::new("feed_scotty=trace,debug"),
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

/// Handles the --dry-run mode: validates config and lists the feeds
fn handle_dry_run(config: &Config) {
    println!("=== Feed Scotty Dry Run ===\n");

    println!("Feeds ({}):", config.feeds.len());
    for feed in &config.feeds {
        println!("  - {} \"{}\" (onFail: {:?})", feed.id, feed.title, feed.on_fail);
        for url in feed.urls() {
            println!("    * {}", url);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Picks the snapshot source: `--snapshots`, else the CI pages URL
///
/// Returns the cache and the root URL the feeds are published at, if known.
fn snapshot_source(snapshots: Option<&str>) -> anyhow::Result<(SnapshotCache, Option<String>)> {
    let root_url = root_url_from_env();

    match snapshots {
        Some(source) if source.starts_with("http://") || source.starts_with("https://") => {
            let store = HttpSnapshotStore::new(source)
                .with_context(|| format!("Invalid snapshot URL {}", source))?;
            tracing::info!("Reading previous snapshots from {}", store.root());
            Ok((
                SnapshotCache::new(store),
                root_url.or_else(|| Some(with_trailing_slash(source))),
            ))
        }
        Some(dir) => {
            tracing::info!("Reading previous snapshots from {}", dir);
            Ok((SnapshotCache::new(FsSnapshotStore::new(dir)), root_url))
        }
        None => match root_url {
            Some(root) => {
                let store = HttpSnapshotStore::new(&root)
                    .with_context(|| format!("Invalid pages URL {}", root))?;
                tracing::info!("Reading previous snapshots from {}", store.root());
                Ok((SnapshotCache::new(store), Some(root)))
            }
            None => {
                tracing::info!("No pages URL known; previous snapshots are not used");
                Ok((SnapshotCache::disabled(), None))
            }
        },
    }
}

/// Handles the main batch run
async fn handle_run(config: Config, cli: &Cli) -> anyhow::Result<()> {
    let scheduled = cli.scheduled
        || std::env::var("GITHUB_EVENT_NAME").map_or(false, |event| event == "schedule");
    let (snapshots, root_url) = snapshot_source(cli.snapshots.as_deref())?;
    let feed_ids: Vec<String> = config.feeds.iter().map(|feed| feed.id.clone()).collect();

    let batch = Batch::new(
        config,
        Arc::new(HttpEngine::default()),
        snapshots,
        FeedWriter::new(&cli.output_dir),
    )
    .scheduled(scheduled)
    .with_concurrency(cli.concurrency)
    .with_root_url(root_url.clone());

    match batch.run().await {
        Ok(report) => {
            tracing::info!("Feeds generated in {}", cli.output_dir.display());
            if let Some(root) = root_url {
                tracing::info!("They will be published at:");
                for id in &feed_ids {
                    tracing::info!("- {}{}.xml", root, id);
                }
                tracing::info!("A combined feed is available at: {}{}.xml", root, COMBINED_FEED_ID);
            }
            if !report.suppressed.is_empty() {
                tracing::warn!("Suppressed failures: {}", report.suppressed.join(", "));
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Batch failed: {}", e);
            Err(e.into())
        }
    }
}
