//! Proxy pool and proxy-list loading
//!
//! Every request attempt draws a proxy uniformly at random, with replacement.
//! Proxies are never scored or removed: a failing proxy is simply followed by
//! another independent draw on the next attempt.

use crate::config::ProxyScheme;
use rand::Rng;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised while building a proxy pool
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Failed to read proxy list {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid proxy entry on line {line}: '{entry}' (expected host:port)")]
    InvalidEntry { line: usize, entry: String },

    #[error("Proxy list is empty")]
    Empty,
}

/// Result type for proxy list operations
pub type ProxyResult<T> = Result<T, ProxyError>;

/// A proxy `host:port` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyEndpoint(String);

impl ProxyEndpoint {
    /// Parses a `host:port` entry
    ///
    /// Returns None if the entry has no host or a non-numeric port.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        let (host, port) = entry.rsplit_once(':')?;
        if host.is_empty() || port.parse::<u16>().is_err() {
            return None;
        }
        Some(Self(entry.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Proxy URL for the given transport scheme, e.g. `socks5://10.0.0.1:1080`
    pub fn url(&self, scheme: ProxyScheme) -> String {
        format!("{}://{}", scheme, self.0)
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A non-empty, read-only set of proxies
#[derive(Debug, Clone)]
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
}

impl ProxyPool {
    /// Creates a pool
    ///
    /// # Returns
    ///
    /// * `Ok(ProxyPool)` - At least one endpoint was given
    /// * `Err(ProxyError::Empty)` - No endpoints
    pub fn new(endpoints: Vec<ProxyEndpoint>) -> ProxyResult<Self> {
        if endpoints.is_empty() {
            return Err(ProxyError::Empty);
        }
        Ok(Self { endpoints })
    }

    /// Picks a proxy uniformly at random
    pub fn pick(&self) -> &ProxyEndpoint {
        let index = rand::rng().random_range(0..self.endpoints.len());
        &self.endpoints[index]
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyEndpoint> {
        self.endpoints.iter()
    }
}

/// Parses a proxy list
///
/// One `host:port` per line. Surrounding whitespace is trimmed; blank lines
/// and lines starting with `#` are skipped.
pub fn parse_proxy_list(content: &str) -> ProxyResult<ProxyPool> {
    let mut endpoints = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let endpoint = ProxyEndpoint::parse(line).ok_or_else(|| ProxyError::InvalidEntry {
            line: index + 1,
            entry: line.to_string(),
        })?;
        endpoints.push(endpoint);
    }

    ProxyPool::new(endpoints)
}

/// Loads a proxy list from a file
///
/// # Returns
///
/// * `Ok(ProxyPool)` - At least one valid proxy was read
/// * `Err(ProxyError)` - The file is missing, unreadable, malformed or empty
pub fn load_proxy_list(path: &Path) -> ProxyResult<ProxyPool> {
    let content = std::fs::read_to_string(path).map_err(|source| ProxyError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let pool = parse_proxy_list(&content)?;
    tracing::info!(count = pool.len(), path = %path.display(), "Loaded proxies");
    Ok(pool)
}
