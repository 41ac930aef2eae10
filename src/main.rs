//! Route-Ripple main entry point
//!
//! This is the command-line interface for the Route-Ripple airport graph crawler.

use clap::Parser;
use route_ripple::config::{load_config_with_hash, validate, Config};
use route_ripple::crawler::{crawl, load_proxy_list};
use route_ripple::output::print_summary;
use route_ripple::source::SourceEndpoints;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Route-Ripple: an airport and flight-route graph crawler
///
/// Route-Ripple seeds itself from the source's airport list, fetches every
/// airport's destinations page through rotating proxies, and follows each
/// destination until the whole reachable graph is known. The result is
/// written as two JSON files: airports with their routes, and airline names.
#[derive(Parser, Debug)]
#[command(name = "route-ripple")]
#[command(version = "1.0.0")]
#[command(about = "An airport and flight-route graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Proxy list file, overriding the configured one
    #[arg(long, value_name = "PATH")]
    proxies: Option<PathBuf>,

    /// Validate config and proxy list and show the plan without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match load_configuration(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    if let Some(proxies) = cli.proxies {
        config.proxies.file = proxies.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(&config, config_hash).await?;
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
            0 => EnvFilter::new("route_ripple=info,warn"),
            1 => EnvFilter::new("route_ripple=debug,info"),
            2 => EnvFilter::new("route_ripple=trace,debug"),
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

/// Loads the config file if one was given, otherwise the defaults
fn load_configuration(
    path: Option<&Path>,
) -> Result<(Config, Option<String>), Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok((config, Some(hash)))
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            let config = Config::default();
            validate(&config)?;
            Ok((config, None))
        }
    }
}

/// Handles the --dry-run mode: validates config and proxies and shows the plan
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Route-Ripple Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!(
        "  Bootstrap attempts: {}",
        config.crawler.bootstrap_attempts
    );
    println!(
        "  Proxy attempts per airport attempt: {}",
        config.crawler.rotation_attempts
    );
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);
    match config.crawler.max_detail_attempts {
        Some(max) => println!("  Airport attempts: at most {}", max),
        None => println!("  Airport attempts: unbounded"),
    }
    println!(
        "  Request timeout: {}s",
        config.crawler.request_timeout_secs
    );

    let endpoints = SourceEndpoints::from_config(&config.source)?;
    println!("\nSource:");
    println!("  Airport list: {}", endpoints.airports_url());
    println!(
        "  Destinations: {}",
        config.source.destinations_path
    );

    println!("\nIdentity:");
    println!("  User-Agent: {}", config.identity.user_agent);
    println!("  Accept-Language: {}", config.identity.accept_language);

    let pool = load_proxy_list(Path::new(&config.proxies.file))?;
    println!("\nProxies:");
    println!("  File: {}", config.proxies.file);
    println!("  Scheme: {}", config.proxies.scheme);
    println!("  Endpoints: {}", pool.len());

    println!("\nOutput:");
    println!("  Airports: {}", config.output.airports_path);
    println!("  Airlines: {}", config.output.carriers_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling through {} proxies", pool.len());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Source: {}, proxies: {}, max concurrent fetches: {}",
        config.source.base_url,
        config.proxies.file,
        config.crawler.max_concurrent_fetches
    );

    match crawl(config).await {
        Ok(mut summary) => {
            summary.config_hash = config_hash;
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
