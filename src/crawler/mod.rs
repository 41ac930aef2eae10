//! Crawler module for airport page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Proxy pool loading and random selection
//! - HTTP fetching through proxies with a browser-like identity
//! - Bounded and unbounded retry policies
//! - Metadata extraction from airport pages
//! - Frontier bookkeeping and overall crawl coordination

mod bootstrap;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod proxy;
mod retry;

#[cfg(test)]
mod fixtures;

pub use bootstrap::{fetch_seed_codes, parse_airport_list};
pub use coordinator::{Coordinator, CrawlResults, WorkerOutcome, WorkerReport};
pub use extractor::{
    extract_airport_page, parse_assignments, AirportPage, ExtractionError, ExtractionResult,
    METADATA_MARKER,
};
pub use fetcher::{build_http_client, FetchError, FetchResult, PageFetcher, ProxiedHttpFetcher};
pub use frontier::{Dispatch, Frontier};
pub use proxy::{
    load_proxy_list, parse_proxy_list, ProxyEndpoint, ProxyError, ProxyPool, ProxyResult,
};
pub use retry::{
    fetch_airport_until_parsed, fetch_with_rotation, DetailRetryPolicy, TransientError,
};

use crate::config::Config;
use crate::output::{summarize, CrawlSummary, JsonFileSink, ResultSink};
use crate::source::SourceEndpoints;
use crate::Result;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the proxy list
/// 2. Build one HTTP client per proxy
/// 3. Fetch the airport list to seed the frontier
/// 4. Crawl until no new airport codes remain
/// 5. Write the airports and carriers files
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed and both files were written
/// * `Err(RippleError)` - A fatal startup or output error
pub async fn crawl(config: &Config) -> Result<CrawlSummary> {
    let pool = load_proxy_list(Path::new(&config.proxies.file))?;
    let fetcher = ProxiedHttpFetcher::new(
        &pool,
        &config.identity,
        config.proxies.scheme,
        config.crawler.request_timeout(),
    )?;
    let sink = JsonFileSink::from_config(&config.output);

    run_crawl_with(config, fetcher, pool, &sink).await
}

/// Runs the bootstrap → crawl → sink pipeline with the given collaborators
///
/// # Example
///
/// ```no_run
/// use route_ripple::config::Config;
/// use route_ripple::crawler::{parse_proxy_list, run_crawl_with, ProxiedHttpFetcher};
/// use route_ripple::output::JsonFileSink;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let pool = parse_proxy_list("127.0.0.1:1080\n")?;
/// let fetcher = ProxiedHttpFetcher::new(
///     &pool,
///     &config.identity,
///     config.proxies.scheme,
///     config.crawler.request_timeout(),
/// )?;
/// let sink = JsonFileSink::new("routes.json", "mapping.json");
/// let summary = run_crawl_with(&config, fetcher, pool, &sink).await?;
/// println!("{} airports", summary.airports);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl_with<F, S>(
    config: &Config,
    fetcher: F,
    pool: ProxyPool,
    sink: &S,
) -> Result<CrawlSummary>
where
    F: PageFetcher + 'static,
    S: ResultSink + ?Sized,
{
    let started_at = Utc::now();
    let endpoints = SourceEndpoints::from_config(&config.source)?;

    let seeds = fetch_seed_codes(
        &fetcher,
        &pool,
        &endpoints,
        config.crawler.bootstrap_attempts,
    )
    .await?;

    let mut coordinator = Coordinator::new(
        Arc::new(fetcher),
        Arc::new(pool),
        Arc::new(endpoints),
        &config.crawler,
    );
    coordinator.seed(seeds);

    let results = coordinator.run().await;
    sink.write(&results.airports, &results.carriers)?;

    Ok(summarize(&results, started_at, Utc::now()))
}
