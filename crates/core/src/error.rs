//! Error types for pagechat operations.
//!
//! Each pipeline stage has its own error enum: [`FetchError`] for the network
//! side and [`ExtractError`] for HTML normalization. [`ScrapeError`] is what
//! the session sees when it runs the whole scrape pipeline, and it knows how to
//! describe itself to an end user without leaking diagnostics.
//!
//! # Example
//!
//! ```rust
//! use pagechat_core::{FetchError, ScrapeError};
//!
//! let err = ScrapeError::from(FetchError::HttpStatusError { code: 404 });
//! assert_eq!(err.stage(), "fetch");
//! assert!(err.user_message().contains("404"));
//! ```

use thiserror::Error;

/// Errors raised while fetching a page over HTTP.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The URL could not be parsed, or its scheme is not http/https.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The server redirected more times than allowed.
    #[error("Too many redirects (limit {max})")]
    TooManyRedirects { max: usize },

    /// The body declared a content-encoding that could not be decoded.
    #[error("Failed to decode response body: {0}")]
    DecodeError(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP status {code}")]
    HttpStatusError { code: u16 },

    /// Any other transport failure: DNS, refused or reset connections.
    #[error("Network error: {0}")]
    Network(String),
}

impl FetchError {
    /// Whether the failure is worth one transparent retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout { .. } | FetchError::Network(_))
    }

    fn user_reason(&self) -> String {
        match self {
            FetchError::InvalidUrl(_) => "that doesn't look like a valid http(s) URL".to_string(),
            FetchError::Timeout { timeout } => format!("the server took longer than {timeout}s to respond"),
            FetchError::TooManyRedirects { .. } => "the page redirected too many times".to_string(),
            FetchError::DecodeError(_) => "the response body could not be decoded".to_string(),
            FetchError::HttpStatusError { code } => format!("the server answered with HTTP {code}"),
            FetchError::Network(_) => "the server could not be reached".to_string(),
        }
    }
}

/// Errors raised while turning HTML into a [`crate::Document`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The body was empty, or parsing produced no usable content at all.
    #[error("Document is empty or could not be parsed")]
    EmptyOrUnparsable,
}

/// Errors surfaced by the session when running a scrape.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Another scrape is already running in this session.
    #[error("A scrape is already in progress")]
    ScrapeInProgress,

    /// The session was shut down while the page was loading.
    #[error("Scrape was cancelled")]
    Cancelled,
}

impl ScrapeError {
    /// Name of the pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            ScrapeError::Fetch(_) => "fetch",
            ScrapeError::Extract(_) => "extract",
            ScrapeError::ScrapeInProgress | ScrapeError::Cancelled => "session",
        }
    }

    /// Message suitable for showing to the person chatting.
    ///
    /// Names the failing stage but never includes transport diagnostics.
    pub fn user_message(&self) -> String {
        match self {
            ScrapeError::Fetch(e) => format!("Couldn't fetch the page: {}.", e.user_reason()),
            ScrapeError::Extract(_) => {
                "Couldn't extract any content: the page is empty or could not be parsed.".to_string()
            }
            ScrapeError::ScrapeInProgress => {
                "A page is already being scraped. Wait for it to finish and try again.".to_string()
            }
            ScrapeError::Cancelled => "The scrape was cancelled before the page finished loading.".to_string(),
        }
    }
}

/// Result type alias defaulting to [`ScrapeError`].
pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
