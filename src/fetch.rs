//! Page fetching. One blocking GET per URL with a politeness delay between requests; no retries.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; web2ebook/0.1)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DELAY_SECS: u64 = 1;
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: could not reach {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("HTTP {status} when fetching: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Source of raw page HTML. The pipeline only talks to pages through this trait.
pub trait Fetch {
    fn fetch(&mut self, url: &Url) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher that enforces a delay between requests.
#[derive(Debug)]
pub struct HttpFetcher {
    inner: reqwest::blocking::Client,
    delay: Duration,
    last_request: Option<Instant>,
}

impl HttpFetcher {
    /// Build a fetcher with default User-Agent, timeout, and delay.
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder::default()
    }

    fn wait_delay(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&mut self, url: &Url) -> Result<String, FetchError> {
        self.wait_delay();
        debug!(%url, "GET");
        let result = self.inner.get(url.clone()).send();
        self.last_request = Some(Instant::now());
        let response = result.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().map_err(|e| FetchError::BodyRead {
            url: url.to_string(),
            source: e,
        })
    }
}

/// Builder for HttpFetcher with optional User-Agent, delay, and timeout.
#[derive(Debug, PartialEq, Eq)]
pub struct HttpFetcherBuilder {
    user_agent: Option<String>,
    delay_secs: u64,
    timeout_secs: u64,
}

impl Default for HttpFetcherBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            delay_secs: DEFAULT_DELAY_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HttpFetcherBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Delay between requests in seconds. Default 1; 0 disables it.
    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn build(self) -> Result<HttpFetcher, FetchError> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        let inner = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpFetcher {
            inner,
            delay: Duration::from_secs(self.delay_secs),
            last_request: None,
        })
    }
}
