//! HTTP fetcher implementation
//!
//! This module handles single HTTP requests for the crawler:
//! - `PageFetcher`: the transport seam the retry layer and the engine are
//!   generic over
//! - `ProxiedHttpFetcher`: the production transport, one client per proxy,
//!   presenting a Chrome-like identity
//!
//! A fetch succeeds whenever a body comes back, whatever the status code.
//! Bad payloads are caught later by extraction.

use crate::config::{IdentityConfig, ProxyScheme};
use crate::crawler::proxy::{ProxyEndpoint, ProxyPool};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Proxy};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Connect timeout applied to every client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single fetch or a bounded series of fetches
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, TLS, proxy handshake, timeout)
    #[error("Request to {url} via {proxy} failed: {error}")]
    Network {
        url: String,
        proxy: String,
        error: String,
    },

    /// The response started but its body could not be read
    #[error("Failed to read body from {url}: {error}")]
    Body { url: String, error: String },

    /// A client for the proxy could not be built
    #[error("Failed to build HTTP client for proxy {proxy}: {error}")]
    ClientBuild { proxy: String, error: String },

    /// Every proxy attempt of a bounded rotation failed
    #[error("All {attempts} attempts to fetch {url} failed, last error: {last}")]
    AllRetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// A transport able to GET a URL through a given proxy
///
/// Implementations must be shareable across worker tasks.
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` through `proxy`, returning the raw body
    fn fetch(
        &self,
        url: &str,
        proxy: &ProxyEndpoint,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Builds an HTTP client routed through `proxy`
///
/// The client presents the configured User-Agent and Accept-Language along
/// with the Accept and client-hint headers a desktop Chrome would send.
///
/// # Example
///
/// ```no_run
/// use route_ripple::config::{IdentityConfig, ProxyScheme};
/// use route_ripple::crawler::{build_http_client, ProxyEndpoint};
/// use std::time::Duration;
///
/// let proxy = ProxyEndpoint::parse("127.0.0.1:1080").unwrap();
/// let client = build_http_client(
///     &IdentityConfig::default(),
///     &proxy,
///     ProxyScheme::Socks5,
///     Duration::from_secs(30),
/// ).unwrap();
/// ```
pub fn build_http_client(
    identity: &IdentityConfig,
    proxy: &ProxyEndpoint,
    scheme: ProxyScheme,
    timeout: Duration,
) -> FetchResult<Client> {
    let build_error = |error: String| FetchError::ClientBuild {
        proxy: proxy.to_string(),
        error,
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&identity.accept_language)
            .map_err(|e| build_error(format!("invalid accept-language: {}", e)))?,
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(
            "\"Chromium\";v=\"124\", \"Google Chrome\";v=\"124\", \"Not-A.Brand\";v=\"99\"",
        ),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );

    let proxy = Proxy::all(proxy.url(scheme)).map_err(|e| build_error(e.to_string()))?;

    Client::builder()
        .user_agent(identity.user_agent.as_str())
        .default_headers(headers)
        .proxy(proxy)
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| build_error(e.to_string()))
}

/// Production fetcher: one pre-built client per proxy endpoint
pub struct ProxiedHttpFetcher {
    clients: HashMap<ProxyEndpoint, Client>,
    identity: IdentityConfig,
    scheme: ProxyScheme,
    timeout: Duration,
}

impl ProxiedHttpFetcher {
    /// Builds a client for every proxy in the pool
    pub fn new(
        pool: &ProxyPool,
        identity: &IdentityConfig,
        scheme: ProxyScheme,
        timeout: Duration,
    ) -> FetchResult<Self> {
        let clients = pool
            .iter()
            .map(|proxy| {
                build_http_client(identity, proxy, scheme, timeout)
                    .map(|client| (proxy.clone(), client))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        tracing::debug!(clients = clients.len(), %scheme, "Built proxied HTTP clients");

        Ok(Self {
            clients,
            identity: identity.clone(),
            scheme,
            timeout,
        })
    }

    /// Returns the client for `proxy`, building one if the proxy is not in
    /// the pool this fetcher was created with
    fn client_for(&self, proxy: &ProxyEndpoint) -> FetchResult<Client> {
        match self.clients.get(proxy) {
            Some(client) => Ok(client.clone()),
            None => build_http_client(&self.identity, proxy, self.scheme, self.timeout),
        }
    }
}

impl PageFetcher for ProxiedHttpFetcher {
    async fn fetch(&self, url: &str, proxy: &ProxyEndpoint) -> Result<String, FetchError> {
        let client = self.client_for(proxy)?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                proxy: proxy.to_string(),
                error: describe_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%url, %proxy, status = status.as_u16(), "Non-success status, keeping body");
        }

        response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            error: describe_error(&e),
        })
    }
}

/// Classifies a reqwest error into a short description
fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
