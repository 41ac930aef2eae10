//! Retry policies for fetching
//!
//! Two policies coexist and are deliberately kept apart:
//!
//! | Path | Function | Attempts | On exhaustion |
//! |------|----------|----------|---------------|
//! | Airport list (bootstrap) | `fetch_with_rotation` | fixed (3) | `AllRetriesExhausted`, run aborts |
//! | Airport page (per code) | `fetch_airport_until_parsed` | unbounded by default | keeps retrying after a fixed delay |
//!
//! Every attempt on either path draws a fresh proxy from the pool.

use crate::config::CrawlerConfig;
use crate::crawler::extractor::{extract_airport_page, AirportPage, ExtractionError};
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::proxy::ProxyPool;
use crate::graph::AirportCode;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// A failure the per-airport path recovers from by retrying
#[derive(Debug, Error)]
pub enum TransientError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Retry settings for the per-airport path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRetryPolicy {
    /// Proxies tried within one attempt before the attempt counts as failed
    pub rotation_attempts: u32,

    /// Fixed pause after a failed attempt
    pub delay: Duration,

    /// Attempts before giving up; None retries forever
    pub max_attempts: Option<u32>,
}

impl DetailRetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            rotation_attempts: config.rotation_attempts,
            delay: config.retry_delay(),
            max_attempts: config.max_detail_attempts,
        }
    }
}

impl Default for DetailRetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Fetches `url` trying up to `attempts` randomly drawn proxies
///
/// # Returns
///
/// * `Ok(String)` - Body from the first proxy that answered
/// * `Err(FetchError::AllRetriesExhausted)` - Every attempt failed
pub async fn fetch_with_rotation<F: PageFetcher>(
    fetcher: &F,
    pool: &ProxyPool,
    url: &str,
    attempts: u32,
) -> Result<String, FetchError> {
    let mut last_error = None;

    for attempt in 1..=attempts {
        let proxy = pool.pick();
        match fetcher.fetch(url, proxy).await {
            Ok(body) => return Ok(body),
            Err(e) => {
                tracing::warn!(
                    %url,
                    %proxy,
                    attempt,
                    max = attempts,
                    error = %e,
                    "Proxy attempt failed"
                );
                last_error = Some(e);
            }
        }
    }

    Err(FetchError::AllRetriesExhausted {
        url: url.to_string(),
        attempts,
        last: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string()),
    })
}

/// Fetches and extracts an airport page, retrying until it parses
///
/// Each attempt is one proxy rotation followed by extraction. Any failure
/// (transport, missing metadata, malformed payload) is logged and retried
/// after `policy.delay`. With `max_attempts` unset this only returns once the
/// page parses, which can be never for a permanently broken page; that only
/// ties up the calling worker.
///
/// # Returns
///
/// * `Some(AirportPage)` - The page parsed
/// * `None` - `policy.max_attempts` was reached
pub async fn fetch_airport_until_parsed<F: PageFetcher>(
    fetcher: &F,
    pool: &ProxyPool,
    code: &AirportCode,
    url: &str,
    policy: &DetailRetryPolicy,
) -> Option<AirportPage> {
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);

        let error = match attempt_airport_page(fetcher, pool, url, policy.rotation_attempts).await {
            Ok(page) => {
                if attempt > 1 {
                    tracing::info!(%code, attempt, "Airport page recovered after retries");
                }
                return Some(page);
            }
            Err(e) => e,
        };

        if policy.max_attempts.is_some_and(|max| attempt >= max) {
            tracing::error!(%code, attempt, error = %error, "Giving up on airport");
            return None;
        }

        tracing::warn!(
            %code,
            attempt,
            delay_ms = policy.delay.as_millis() as u64,
            error = %error,
            "Error while fetching airport, retrying"
        );
        sleep(policy.delay).await;
    }
}

async fn attempt_airport_page<F: PageFetcher>(
    fetcher: &F,
    pool: &ProxyPool,
    url: &str,
    rotation_attempts: u32,
) -> Result<AirportPage, TransientError> {
    let body = fetch_with_rotation(fetcher, pool, url, rotation_attempts).await?;
    Ok(extract_airport_page(&body)?)
}
