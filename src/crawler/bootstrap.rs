//! Airport-list bootstrap
//!
//! The crawl is seeded from the source's airport list:
//! `{"response": {"airports": [{"IATA": "AAA", ...}, ...]}}`.
//! The list is fetched on the bounded retry path; failing to get it is fatal.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::proxy::ProxyPool;
use crate::crawler::retry::fetch_with_rotation;
use crate::graph::AirportCode;
use crate::source::SourceEndpoints;
use crate::RippleError;
use serde::Deserialize;
use std::collections::BTreeSet;

#[derive(Debug, Deserialize)]
struct AirportListing {
    response: ListingBody,
}

#[derive(Debug, Deserialize)]
struct ListingBody {
    airports: Vec<ListedAirport>,
}

#[derive(Debug, Deserialize)]
struct ListedAirport {
    #[serde(rename = "IATA")]
    iata: Option<String>,
}

/// Parses the airport-list payload into the seed code set
///
/// Entries with a null or empty code are skipped; duplicates collapse.
pub fn parse_airport_list(body: &str) -> Result<BTreeSet<AirportCode>, serde_json::Error> {
    let listing: AirportListing = serde_json::from_str(body)?;
    let listed = listing.response.airports.len();

    let codes: BTreeSet<AirportCode> = listing
        .response
        .airports
        .into_iter()
        .filter_map(|airport| airport.iata)
        .filter(|code| !code.is_empty())
        .map(AirportCode::from)
        .collect();

    if codes.len() != listed {
        tracing::debug!(
            listed,
            unique = codes.len(),
            "Airport list had blank or duplicate codes"
        );
    }

    Ok(codes)
}

/// Fetches the airport list and returns the seed codes
///
/// # Returns
///
/// * `Ok(BTreeSet<AirportCode>)` - The seed set
/// * `Err(RippleError::Bootstrap)` - Every proxy attempt failed
/// * `Err(RippleError::BootstrapPayload)` - The list did not decode
pub async fn fetch_seed_codes<F: PageFetcher>(
    fetcher: &F,
    pool: &ProxyPool,
    endpoints: &SourceEndpoints,
    attempts: u32,
) -> Result<BTreeSet<AirportCode>, RippleError> {
    let url = endpoints.airports_url();
    tracing::info!(%url, "Fetching airports list");

    let body = fetch_with_rotation(fetcher, pool, url.as_str(), attempts)
        .await
        .map_err(|source| RippleError::Bootstrap {
            url: url.to_string(),
            source,
        })?;

    let codes = parse_airport_list(&body).map_err(|e| RippleError::BootstrapPayload {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    tracing::info!(count = codes.len(), "Loaded airport list");
    Ok(codes)
}
