//! Site-Research main entry point
//!
//! This is the command-line interface for the website research crawler.

use clap::Parser;
use std::path::{Path, PathBuf};
use site_research::config::{load_config_with_hash, Config};
use site_research::crawler::{CrawlRequest, CrawlSettings, Crawler};
use site_research::enrich::{enrich_pages, HttpCompletionClient, PageEnrichment};
use site_research::output::{
    build_output, generate_markdown_summary, load_statistics, print_statistics,
    write_json_report,
};
use site_research::storage::{open_storage, persist_enrichment, persist_result};
use tracing_subscriber::EnvFilter;

/// Site-Research: a bounded website research crawler
///
/// Crawls a same-origin subset of a website while respecting robots.txt and
/// pacing, then reports pages, findings and highlights.
#[derive(Parser, Debug)]
#[command(name = "site-research")]
#[command(version)]
#[command(about = "A bounded website research crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Absolute http(s) URL to start from
    #[arg(value_name = "START_URL", required_unless_present = "stats")]
    start_url: Option<String>,

    /// Page budget (defaults to the config, capped at 200)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Depth budget (defaults to the config, capped at 3)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Leave the sitemap out of the report
    #[arg(long)]
    no_sitemap: bool,

    /// Skip completion-service enrichment even when configured
    #[arg(long)]
    no_enrich: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and start URL and show the crawl plan without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of a stored crawl and exit
    #[arg(long, value_name = "CRAWL_ID", conflicts_with = "dry_run")]
    stats: Option<i64>,
}

impl Cli {
    /// Builds the crawl request from config defaults and command-line overrides
    fn crawl_request(&self, config: &Config, start_url: &str) -> CrawlRequest {
        let crawler = &config.crawler;
        CrawlRequest::new(start_url)
            .with_max_pages(self.max_pages.unwrap_or(crawler.max_pages))
            .with_max_depth(self.max_depth.unwrap_or(crawler.max_depth))
            .with_sitemap(crawler.include_sitemap && !self.no_sitemap)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(crawl_id) = cli.stats {
        return handle_stats(&config, crawl_id);
    }

    let start_url = cli
        .start_url
        .clone()
        .ok_or("START_URL is required")?;
    let request = cli.crawl_request(&config, &start_url);

    if cli.dry_run {
        handle_dry_run(&config, &request)
    } else {
        handle_crawl(&config, &config_hash, &request, !cli.no_enrich).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_research=info,warn"),
            1 => EnvFilter::new("site_research=debug,info"),
            2 => EnvFilter::new("site_research=trace,debug"),
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

/// Handles the --dry-run mode: validates the request and shows the crawl plan
fn handle_dry_run(
    config: &Config,
    request: &CrawlRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = request.validate()?;

    println!("=== Site-Research Dry Run ===\n");

    println!("Crawl Request:");
    println!("  Start URL: {}", start);
    println!("  Max pages: {}", request.max_pages);
    println!("  Max depth: {}", request.max_depth);
    println!("  Include sitemap: {}", request.include_sitemap);

    println!("\nPacing:");
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  robots.txt timeout: {}s", config.crawler.robots_timeout_secs);
    println!("  robots.txt TTL: {}h", config.crawler.robots_ttl_hours);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.user_agent_string());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Report: {}", config.output.report_path);
    println!("  Summary: {}", config.output.summary_path);

    match &config.completion {
        Some(completion) => println!(
            "\nEnrichment: {} via {}",
            completion.model, completion.endpoint
        ),
        None => println!("\nEnrichment: not configured"),
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl up to {} pages from {}",
        request.max_pages,
        site_research::url::origin_of(&start)
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics of a stored crawl
fn handle_stats(config: &Config, crawl_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, crawl_id)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main research crawl
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    request: &CrawlRequest,
    enrich: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Researching {} (max {} pages, depth {})",
        request.start_url,
        request.max_pages,
        request.max_depth
    );

    let crawler = Crawler::new(CrawlSettings::from_config(config))?;
    let result = match crawler.run(request).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let enrichments: Vec<PageEnrichment> = match (&config.completion, enrich) {
        (Some(completion), true) => {
            let client = HttpCompletionClient::from_config(completion)?;
            tracing::info!("Enriching {} pages with {}", result.pages.len(), completion.model);
            enrich_pages(&client, &result.pages).await
        }
        _ => Vec::new(),
    };

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let crawl_id = persist_result(&mut storage, request, config_hash, &result)?;
    persist_enrichment(&mut storage, crawl_id, &enrichments)?;

    let output = build_output(&result, request.include_sitemap, &enrichments);
    write_json_report(&output, Path::new(&config.output.report_path))?;
    generate_markdown_summary(
        &output,
        &result.errors,
        Path::new(&config.output.summary_path),
    )?;

    tracing::info!(
        "Crawl {} stored: {} pages, {} errors",
        crawl_id,
        result.pages.len(),
        result.errors.len()
    );
    println!("✓ Report written to: {}", config.output.report_path);
    println!("✓ Summary written to: {}", config.output.summary_path);

    Ok(())
}
