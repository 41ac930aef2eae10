//! Route-Ripple: an airport and flight-route graph crawler
//!
//! This crate discovers the worldwide airport graph by fetching per-airport
//! destination pages through rotating proxies, extracting the embedded
//! metadata, and following every destination code until nothing new remains.

pub mod config;
pub mod crawler;
pub mod graph;
pub mod output;
pub mod source;
pub mod state;

use thiserror::Error;

/// Main error type for Route-Ripple operations
///
/// Every variant here is fatal for a crawl run: transient per-airport failures
/// are absorbed inside the crawler and never surface as a `RippleError`.
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Proxy list error: {0}")]
    Proxy(#[from] crawler::ProxyError),

    #[error("Failed to fetch airport list from {url}: {source}")]
    Bootstrap {
        url: String,
        source: crawler::FetchError,
    },

    #[error("Invalid airport list from {url}: {message}")]
    BootstrapPayload { url: String, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] crawler::FetchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Route-Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use graph::{Airport, AirportCode, Carrier, CarrierMap, Route};
pub use state::CodeState;
