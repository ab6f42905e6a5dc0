//! Kumo-Ingest main entry point
//!
//! This is the command-line interface for the Kumo-Ingest article
//! crawling engine.

use anyhow::{bail, Context};
use clap::Parser;
use kumo_ingest::config::{load_config_with_hash, Config};
use kumo_ingest::crawler::{CancellationFlag, CrawlSession};
use kumo_ingest::extract::HybridExtractor;
use kumo_ingest::fetch::{
    BrowserFetcher, Fetcher, HttpFetcher, HttpFetcherOptions, HybridFetcher, RateLimiter,
};
use kumo_ingest::storage::{ArticleStore, MemoryStore};
use kumo_ingest::url::extract_domain;
use kumo_ingest::workflow::{run_article_workflow, HookRegistry, NoopStages};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Kumo-Ingest: an article crawling and ingestion engine
///
/// Kumo-Ingest walks the listing pages of configured news sources,
/// collects article links, extracts clean article text with quality
/// scoring, and drives each article through its processing workflow.
#[derive(Parser, Debug)]
#[command(name = "kumo-ingest")]
#[command(version = "1.0.0")]
#[command(about = "An article crawling and ingestion engine", long_about = None)]
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

    /// Only crawl the source with this name
    #[arg(long, value_name = "NAME")]
    source: Option<String>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(name) = &cli.source {
        if !config.sources.iter().any(|s| &s.name == name) {
            bail!("no source named '{name}' in configuration");
        }
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.source).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kumo_ingest=info,warn"),
            1 => EnvFilter::new("kumo_ingest=debug,info"),
            2 => EnvFilter::new("kumo_ingest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Kumo-Ingest Dry Run ===\n");

    println!("Fetch Configuration:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Max retries: {}", config.fetch.max_retries);
    println!("  Domain delay: {}ms", config.fetch.domain_delay_ms);
    println!("  HTTP concurrency: {}", config.fetch.max_concurrency);
    println!(
        "  Browser concurrency: {}",
        config.fetch.browser_max_concurrency
    );

    println!("\nWorkflow:");
    println!("  Max retries: {}", config.workflow.max_retries);
    println!("  Translation: {}", config.workflow.translate);

    println!("\nSources ({}):", config.sources.len());
    for source in &config.sources {
        println!("  - {} ({})", source.name, source.base_url);
        if source.requires_js {
            println!("    requires JavaScript rendering");
        }
        if let Some(strategy) = source.pagination.strategy {
            println!("    pagination: {strategy:?}, max {} pages", source.pagination.max_pages);
        } else {
            println!("    pagination: adaptive, max {} pages", source.pagination.max_pages);
        }
        if !source.links.include.is_empty() {
            println!("    include patterns: {:?}", source.links.include);
        }
        if let Some(cap) = source.max_articles {
            println!("    article cap: {cap}");
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} source(s)", config.sources.len());
}

/// Handles the main crawl operation: one session per source, then the
/// processing workflow for every article the sessions collected
async fn handle_crawl(config: Config, only_source: Option<String>) -> anyhow::Result<()> {
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(
        config.fetch.domain_delay_ms,
    )));

    let http = Arc::new(HttpFetcher::new(
        HttpFetcherOptions {
            user_agent: config.fetch.user_agent.clone(),
            accept_language: config.fetch.accept_language.clone(),
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            max_retries: config.fetch.max_retries,
            allow_private_networks: config.fetch.allow_private_networks,
        },
        Arc::clone(&limiter),
    )?);

    let browser = BrowserFetcher::new(
        config.fetch.browser_max_concurrency,
        Duration::from_secs(config.fetch.timeout_secs),
    );
    let browser: Option<Arc<dyn Fetcher>> = if browser.is_available() {
        Some(Arc::new(browser))
    } else {
        tracing::info!("browser fetcher unavailable, JavaScript sources will degrade");
        None
    };

    let fetcher = Arc::new(
        HybridFetcher::new(http as Arc<dyn Fetcher>, browser)
            .with_min_html_length(config.fetch.min_html_length),
    );

    // Per-source tuning: request delays and known browser-only domains
    for source in &config.sources {
        let domain = source
            .domain
            .clone()
            .or_else(|| Url::parse(&source.base_url).ok().and_then(|u| extract_domain(&u)));
        if let Some(domain) = domain {
            if let Some(ms) = source.delay_ms {
                limiter.set_domain_delay(&domain, Duration::from_millis(ms));
            }
            if source.requires_js {
                fetcher.mark_browser_required(&domain);
            }
        }
    }

    let store: Arc<dyn ArticleStore> = Arc::new(MemoryStore::new());
    let hooks = Arc::new(HookRegistry::new());

    // Ctrl-C stops sessions cooperatively between fetches
    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, finishing in-flight fetches");
                cancel.cancel();
            }
        });
    }

    for source in &config.sources {
        if let Some(only) = &only_source {
            if &source.name != only {
                continue;
            }
        }
        if cancel.is_cancelled() {
            break;
        }

        let session = CrawlSession::new(
            Arc::clone(&fetcher) as Arc<dyn Fetcher>,
            Arc::clone(&store),
            source.clone(),
            config.fetch.max_concurrency,
        )
        .with_cancellation(cancel.clone());

        let result = match session.run().await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(source = %source.name, "crawl session failed: {}", e);
                continue;
            }
        };

        println!(
            "{}: {} found, {} new, {} duplicates, {} errors, {} pages",
            source.name,
            result.found,
            result.new,
            result.duplicates,
            result.errors,
            result.pages_crawled
        );

        let extractor = HybridExtractor::new(source.min_quality);
        let pending = store.list_in_state("collected").await?;
        for record in pending.iter().filter(|r| r.source == source.name) {
            if cancel.is_cancelled() {
                break;
            }
            match run_article_workflow(
                &record.url,
                Arc::clone(&store),
                Arc::clone(&hooks),
                &config.workflow,
                &extractor,
                &NoopStages,
            )
            .await
            {
                Ok(processed) => {
                    tracing::info!(
                        url = %processed.url,
                        state = %processed.state,
                        quality = ?processed.quality,
                        "article processed"
                    );
                }
                Err(e) => {
                    tracing::error!(url = %record.url, "article workflow failed: {}", e);
                }
            }
        }
    }

    let completed = store.list_in_state("completed").await?.len();
    let failed = store.list_in_state("failed").await?.len();
    println!(
        "Done: {} article(s) stored, {} completed, {} failed",
        store.count().await?,
        completed,
        failed
    );

    Ok(())
}
