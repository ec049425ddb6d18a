//! Page fetching over HTTP.
//!
//! [`HttpFetcher`] wraps a `reqwest` client configured with a timeout, a
//! redirect cap and gzip/deflate/brotli decoding. Transient network failures
//! are retried once after a short backoff; everything else surfaces at once.
//! The [`PageFetcher`] trait is the seam the session depends on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, redirect};
use time::OffsetDateTime;
use url::Url;

use crate::error::FetchError;

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds, covering connect, redirects and body.
    pub timeout: u64,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// Pause before the single retry of a transient failure.
    pub retry_backoff: Duration,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 15,
            max_redirects: 5,
            retry_backoff: Duration::from_millis(300),
            user_agent: "Mozilla/5.0 (compatible; Pagechat/0.1; +https://example.invalid/pagechat)".to_string(),
        }
    }
}

/// A successfully fetched page body.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// URL as requested.
    pub requested_url: Url,
    /// URL after following redirects; relative links resolve against this.
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    /// Decoded body text.
    pub body: String,
    pub fetched_at: OffsetDateTime,
}

impl RawPage {
    /// Wraps HTML the caller already has, e.g. a local file.
    pub fn from_html(url: Url, body: impl Into<String>) -> Self {
        Self {
            requested_url: url.clone(),
            final_url: url,
            status: 200,
            content_type: Some("text/html".to_string()),
            body: body.into(),
            fetched_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Something that can turn a URL into a [`RawPage`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawPage, FetchError>;
}

/// Validates `url` as an absolute http(s) URL with a host.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "unsupported scheme '{}', expected http or https",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl("URL has no host".to_string()));
    }

    Ok(parsed)
}

/// `reqwest`-backed [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Builds the underlying client from `config`.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn fetch_once(&self, url: &Url) -> Result<RawPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| self.classify(e, false))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatusError { code: status.as_u16() });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let encoded = response.headers().contains_key(CONTENT_ENCODING);

        let body = response.text().await.map_err(|e| self.classify(e, encoded))?;

        Ok(RawPage {
            requested_url: url.clone(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
            fetched_at: OffsetDateTime::now_utc(),
        })
    }

    /// Maps a reqwest error onto the fetch taxonomy.
    fn classify(&self, err: reqwest::Error, encoded_body: bool) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout { timeout: self.config.timeout }
        } else if err.is_redirect() {
            FetchError::TooManyRedirects { max: self.config.max_redirects }
        } else if err.is_decode() || (encoded_body && err.is_body()) {
            FetchError::DecodeError(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::HttpStatusError { code: status.as_u16() }
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage, FetchError> {
        let url = parse_http_url(url)?;

        match self.fetch_once(&url).await {
            Err(err) if err.is_transient() => {
                tracing::warn!(%url, error = %err, "transient fetch failure, retrying once");
                tokio::time::sleep(self.config.retry_backoff).await;
                self.fetch_once(&url).await
            }
            other => other,
        }
    }
}
