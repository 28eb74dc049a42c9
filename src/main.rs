//! Catalog-Crawler main entry point
//!
//! This is the command-line interface for the Catalog-Crawler service.

use anyhow::Context;
use catalog_crawler::config::{load_config_with_hash, Config, StorageBackend};
use catalog_crawler::crawler::{run_service, stop_channel};
use catalog_crawler::storage::open_storage;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Crawler: a durable product-link harvester
///
/// Catalog-Crawler polls a queue of e-commerce sites, discovers their
/// category pages, and walks every category's pagination to collect product
/// links. Progress is checkpointed per category so interrupted sites resume
/// where they stopped.
#[derive(Parser, Debug)]
#[command(name = "catalog-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A durable product-link harvester", long_about = None)]
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

    /// Validate config and show the effective settings without crawling
    #[arg(long, conflicts_with_all = ["stats", "add", "fetch"])]
    dry_run: bool,

    /// Show pipeline statistics from storage and exit
    #[arg(long, conflicts_with_all = ["dry_run", "add", "fetch"])]
    stats: bool,

    /// Queue sites by URL and exit
    #[arg(long, value_name = "URL", num_args = 1.., conflicts_with_all = ["dry_run", "stats", "fetch"])]
    add: Vec<String>,

    /// Print the collected product links for a domain or URL and exit
    #[arg(long, value_name = "DOMAIN", conflicts_with_all = ["dry_run", "stats", "add"])]
    fetch: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if !cli.add.is_empty() {
        handle_add(&config, &cli.add)?;
    } else if let Some(target) = cli.fetch.as_deref() {
        handle_fetch(&config, target)?;
    } else {
        handle_service(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_crawler=info,warn"),
            1 => EnvFilter::new("catalog_crawler=debug,info"),
            2 => EnvFilter::new("catalog_crawler=trace,debug"),
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

/// Handles the --dry-run mode: prints the validated settings
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Crawler Dry Run ===\n");

    println!("Scheduler:");
    println!("  Poll interval: {}ms", config.scheduler.poll_interval_ms);
    println!("  Max concurrent workers: {}", config.scheduler.max_concurrent_workers);

    println!("\nCrawler:");
    println!("  Page batch size: {}", config.crawler.page_batch_size);
    println!("  Inter-page delay: {}ms", config.crawler.inter_page_delay_ms);
    println!("  Page timeout: {}ms", config.crawler.page_timeout_ms);
    println!("  Page parameter: {}", config.crawler.page_param);
    match config.crawler.max_categories_per_job {
        Some(max) => println!("  Categories per job: at most {}", max),
        None => println!("  Categories per job: all"),
    }
    println!(
        "  Product path markers: {}",
        config.crawler.product_path_markers.join(", ")
    );

    println!("\nDiscovery:");
    println!("  Enabled: {}", config.discovery.enabled);
    println!("  Poll interval: {}ms", config.discovery.poll_interval_ms);
    println!("  Words to ignore: {}", config.discovery.words_to_ignore.join(", "));

    println!("\nStorage:");
    match config.storage.backend {
        StorageBackend::Filesystem => println!("  Filesystem: {}", config.storage.data_dir),
        StorageBackend::Sqlite => println!(
            "  SQLite: {}",
            config.storage.database_path.as_deref().unwrap_or("(unset)")
        ),
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    match &config.api {
        Some(api) => println!("\nAPI: http://{}:{}", api.host, api.port),
        None => println!("\nAPI: disabled"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows pipeline statistics
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use catalog_crawler::output::{load_statistics, print_statistics};

    let storage = open_storage(&config.storage)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --add mode: queues each URL's domain
fn handle_add(config: &Config, urls: &[String]) -> anyhow::Result<()> {
    let storage = open_storage(&config.storage)?;
    let report = catalog_crawler::api::add_sites(storage.queue.as_ref(), urls)?;

    for domain in &report.created {
        println!("✓ Queued {}", domain);
    }
    for domain in &report.already_queued {
        println!("  {} is already queued", domain);
    }

    Ok(())
}

/// Handles the --fetch mode: prints one site's result entry as JSON
fn handle_fetch(config: &Config, target: &str) -> anyhow::Result<()> {
    let storage = open_storage(&config.storage)?;
    let links = catalog_crawler::api::fetch_result(storage.results.as_ref(), target)?;
    println!("{}", serde_json::to_string_pretty(&links)?);

    Ok(())
}

/// Handles the main service operation until Ctrl-C
async fn handle_service(config: Config) -> anyhow::Result<()> {
    let (handle, signal) = stop_channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl-C, finishing in-flight batches");
                handle.stop();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    run_service(config, signal).await?;
    tracing::info!("Service exited cleanly");

    Ok(())
}
