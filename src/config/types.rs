use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for Route-Ripple
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub source: SourceConfig,
    pub identity: IdentityConfig,
    pub proxies: ProxyConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of airport fetches in flight at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Proxy attempts for the airport-list fetch before the run aborts
    #[serde(rename = "bootstrap-attempts")]
    pub bootstrap_attempts: u32,

    /// Proxy attempts within a single airport-page attempt
    #[serde(rename = "rotation-attempts")]
    pub rotation_attempts: u32,

    /// Fixed delay between failed airport-page attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Give up on an airport after this many failed attempts (unset = never)
    #[serde(rename = "max-detail-attempts")]
    pub max_detail_attempts: Option<u32>,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 200,
            bootstrap_attempts: 3,
            rotation_attempts: 3,
            retry_delay_ms: 60_000,
            max_detail_attempts: None,
            request_timeout_secs: 30,
        }
    }
}

/// Remote data source locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL every other path is resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the JSON airport list used to seed the crawl
    #[serde(rename = "airports-path")]
    pub airports_path: String,

    /// Path template of an airport's destinations page; `{code}` is substituted
    #[serde(rename = "destinations-path")]
    pub destinations_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.flightsfrom.com".to_string(),
            airports_path: "airports".to_string(),
            destinations_path: "{code}/destinations".to_string(),
        }
    }
}

/// Browser identity presented on every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

/// Transport scheme used to reach the proxies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyScheme {
    #[default]
    Socks5,
    Socks5h,
    Http,
    Https,
}

impl ProxyScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Socks5 => "socks5",
            Self::Socks5h => "socks5h",
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proxy list configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Newline-delimited `host:port` list
    pub file: String,

    pub scheme: ProxyScheme,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            file: "proxies.txt".to_string(),
            scheme: ProxyScheme::Socks5,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the airport → record JSON file
    #[serde(rename = "airports-path")]
    pub airports_path: String,

    /// Path of the carrier code → name JSON file
    #[serde(rename = "carriers-path")]
    pub carriers_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            airports_path: "airline_routes.json".to_string(),
            carriers_path: "airline_mapping.json".to_string(),
        }
    }
}
