//! Remote data source endpoints
//!
//! Builds the two kinds of URL the crawler requests:
//! - the airport list used to seed the frontier
//! - one destinations page per airport code
//!
//! Paths are appended segment by segment so airport codes are always
//! percent-encoded as a single path segment.

use crate::config::SourceConfig;
use crate::graph::AirportCode;
use crate::ConfigError;
use url::Url;

/// Placeholder replaced by the airport code in the destinations path
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Resolved locations of the remote source
#[derive(Debug, Clone)]
pub struct SourceEndpoints {
    base: Url,
    airports_path: String,
    destinations_path: String,
}

impl SourceEndpoints {
    /// Creates endpoints from a base URL and the two path templates
    ///
    /// # Returns
    ///
    /// * `Ok(SourceEndpoints)` - The base URL is an absolute http(s) URL
    /// * `Err(ConfigError)` - The base URL cannot carry paths
    pub fn new(
        base_url: &str,
        airports_path: &str,
        destinations_path: &str,
    ) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(format!(
                "base_url '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            base,
            airports_path: airports_path.to_string(),
            destinations_path: destinations_path.to_string(),
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, ConfigError> {
        Self::new(
            &config.base_url,
            &config.airports_path,
            &config.destinations_path,
        )
    }

    /// URL of the JSON airport list
    pub fn airports_url(&self) -> Url {
        self.with_segments(self.airports_path.split('/').map(str::to_string))
    }

    /// URL of the destinations page for `code`
    ///
    /// # Example
    ///
    /// ```
    /// use route_ripple::source::SourceEndpoints;
    /// use route_ripple::AirportCode;
    ///
    /// let endpoints = SourceEndpoints::new(
    ///     "https://www.flightsfrom.com",
    ///     "airports",
    ///     "{code}/destinations",
    /// ).unwrap();
    /// let url = endpoints.destinations_url(&AirportCode::from("LHR"));
    /// assert_eq!(url.as_str(), "https://www.flightsfrom.com/LHR/destinations");
    /// ```
    pub fn destinations_url(&self, code: &AirportCode) -> Url {
        self.with_segments(
            self.destinations_path
                .split('/')
                .map(|segment| segment.replace(CODE_PLACEHOLDER, code.as_str())),
        )
    }

    fn with_segments(&self, segments: impl Iterator<Item = String>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments.filter(|s| !s.is_empty()) {
                path.push(&segment);
            }
        }
        url
    }
}
