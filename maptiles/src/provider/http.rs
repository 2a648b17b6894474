//! HTTP client abstraction for testability

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, trace, warn};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User-Agent sent with every tile request.
///
/// Public tile servers (OpenStreetMap in particular) reject anonymous clients.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "maptiles/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/maptiles/maptiles)"
);

/// Errors from a single HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Client could not be constructed
    Client(String),
    /// Connection, timeout or protocol failure
    Request(String),
    /// Server answered with a non-success status
    Status(u16),
    /// Response body could not be read
    Body(String),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Client(msg) => write!(f, "Failed to create HTTP client: {}", msg),
            HttpError::Request(msg) => write!(f, "Request failed: {}", msg),
            HttpError::Status(code) => write!(f, "HTTP {}", code),
            HttpError::Body(msg) => write!(f, "Failed to read response: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for async HTTP GET.
///
/// Allows providers to be tested against scripted clients.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Fetches `url`, returning the body of a successful response.
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, HttpError>> + Send;
}

/// Async HTTP client using reqwest.
///
/// Cloning is cheap and shares the connection pool.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout.
    ///
    /// Tuned for many small parallel downloads:
    /// - Large idle pool per host
    /// - TCP keepalive and nodelay
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(128)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Bytes, HttpError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(HttpError::Request(e.to_string()));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes)
            }
            Err(e) => Err(HttpError::Body(e.to_string())),
        }
    }
}
