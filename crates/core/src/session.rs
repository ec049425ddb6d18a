//! Chat session entry point.
//!
//! A [`Session`] owns one [`SourceStore`], the append-only conversation
//! history, and the fetcher. Every inbound message goes through
//! [`Session::handle`], which classifies it with [`classify`] and dispatches:
//!
//! - `source` shows the active source's provenance,
//! - `scrape: <url>` runs fetch, extract and store,
//! - anything else is a question for the [`QueryResolver`].
//!
//! # Example
//!
//! ```rust,no_run
//! use pagechat_core::{Session, SessionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(SessionConfig::builder().timeout(10).build())?;
//! session.handle("scrape: https://example.com").await;
//! let reply = session.handle("what is this domain for?").await;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{FetchError, Result, ScrapeError};
use crate::extract::{ExtractConfig, extract_with_config};
use crate::fetch::{FetchConfig, HttpFetcher, PageFetcher, RawPage};
use crate::query::{QueryResolver, ResolverConfig};
use crate::store::{Source, SourceMeta, SourceStore};

/// Message that shows the current source, matched case-insensitively.
pub const SHOW_SOURCE_KEYWORD: &str = "source";

/// Prefix of a scrape command, matched case-insensitively.
pub const SCRAPE_PREFIX: &str = "scrape:";

/// Reply to `source` before anything has been scraped.
pub const NO_SOURCE_MESSAGE: &str = "No source scraped yet. Send \"scrape: <url>\" to load a page.";

/// What an inbound message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ShowSource,
    Scrape { url: String },
    Question { text: String },
}

/// Classifies a raw message. Total and side-effect free.
///
/// Rules, applied in order to the trimmed message:
/// 1. exactly `source` (any case) is [`Intent::ShowSource`];
/// 2. starting with `scrape:` (any case, no space before the colon) is
///    [`Intent::Scrape`] with the rest, trimmed, as the URL;
/// 3. everything else is an [`Intent::Question`].
pub fn classify(message: &str) -> Intent {
    let trimmed = message.trim();

    if trimmed.eq_ignore_ascii_case(SHOW_SOURCE_KEYWORD) {
        return Intent::ShowSource;
    }

    if let Some(prefix) = trimmed.get(..SCRAPE_PREFIX.len())
        && prefix.eq_ignore_ascii_case(SCRAPE_PREFIX)
    {
        return Intent::Scrape { url: trimmed[SCRAPE_PREFIX.len()..].trim().to_string() };
    }

    Intent::Question { text: trimmed.to_string() }
}

/// Author of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// One immutable entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub is_error: bool,
}

impl Message {
    fn new(role: Role, content: impl Into<String>, is_error: bool) -> Self {
        Self { id: Uuid::new_v4(), role, content: content.into(), timestamp: OffsetDateTime::now_utc(), is_error }
    }
}

/// Kind of reply, so hosts can style it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Scraped,
    Source,
    Answer,
    Error,
}

/// What the host renders for a turn: plain text plus optional provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub text: String,
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_meta: Option<SourceMeta>,
    /// Match confidence, for answers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Response {
    fn new(text: impl Into<String>, kind: ResponseKind, source: Option<&Source>) -> Self {
        Self { text: text.into(), kind, source_meta: source.map(Source::meta), confidence: None }
    }

    fn error(err: &ScrapeError) -> Self {
        Self::new(err.user_message(), ResponseKind::Error, None)
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResponseKind::Error
    }
}

/// Settings for every stage of a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub resolver: ResolverConfig,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }
}

/// Fluent builder for [`SessionConfig`].
///
/// ```rust
/// use pagechat_core::SessionConfig;
///
/// let config = SessionConfig::builder().timeout(5).max_redirects(3).max_answer_chars(400).build();
/// assert_eq!(config.fetch.max_redirects, 3);
/// ```
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.fetch.timeout = secs;
        self
    }

    pub fn max_redirects(mut self, value: usize) -> Self {
        self.config.fetch.max_redirects = value;
        self
    }

    pub fn retry_backoff(mut self, value: Duration) -> Self {
        self.config.fetch.retry_backoff = value;
        self
    }

    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    pub fn min_paragraph_chars(mut self, value: usize) -> Self {
        self.config.extract.min_paragraph_chars = value;
        self
    }

    pub fn max_answer_chars(mut self, value: usize) -> Self {
        self.config.resolver.max_answer_chars = value;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// One chat session: a single active source and its conversation.
pub struct Session<F = HttpFetcher> {
    fetcher: F,
    extract: ExtractConfig,
    resolver: QueryResolver,
    store: SourceStore,
    history: Mutex<Vec<Message>>,
    scrape_guard: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
}

impl Session<HttpFetcher> {
    /// Creates a session that fetches over HTTP.
    pub fn new(config: SessionConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.fetch.clone())?;
        Ok(Self::with_fetcher(fetcher, config))
    }
}

impl<F: PageFetcher> Session<F> {
    /// Creates a session around any [`PageFetcher`].
    pub fn with_fetcher(fetcher: F, config: SessionConfig) -> Self {
        Self {
            fetcher,
            extract: config.extract,
            resolver: QueryResolver::new(config.resolver),
            store: SourceStore::new(),
            history: Mutex::new(Vec::new()),
            scrape_guard: tokio::sync::Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    /// Handles one inbound message and records the exchange.
    ///
    /// The user message is stamped on arrival but appended together with the
    /// reply, so overlapping calls never interleave in [`Session::history`].
    pub async fn handle(&self, message: &str) -> Response {
        let inbound = Message::new(Role::User, message, false);

        let response = match classify(message) {
            Intent::ShowSource => self.show_source(),
            Intent::Scrape { url } => match self.scrape(&url).await {
                Ok(source) => scraped(&source),
                Err(err) => Response::error(&err),
            },
            Intent::Question { text } => self.answer(&text),
        };

        self.record_exchange(inbound, &response);
        response
    }

    /// Fetches, extracts and activates `url`.
    ///
    /// At most one scrape runs at a time; a concurrent call is rejected with
    /// [`ScrapeError::ScrapeInProgress`]. On any failure the previous source
    /// stays active.
    pub async fn scrape(&self, url: &str) -> Result<Arc<Source>> {
        let _guard = self.scrape_guard.try_lock().map_err(|_| ScrapeError::ScrapeInProgress)?;
        tracing::info!(url, "scraping");

        let result = self.run_scrape(url).await;

        match &result {
            Ok(source) => tracing::info!(
                url,
                headings = source.document.headings.len(),
                paragraphs = source.document.paragraphs.len(),
                links = source.document.links.len(),
                "scrape complete"
            ),
            Err(err) => tracing::warn!(url, stage = err.stage(), error = %err, "scrape failed"),
        }

        result
    }

    async fn run_scrape(&self, url: &str) -> Result<Arc<Source>> {
        let raw = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(ScrapeError::Cancelled),
            fetched = self.fetcher.fetch(url) => fetched?,
        };
        let document = extract_with_config(&raw, &self.extract)?;
        Ok(self.store.set_active(document, url.trim()))
    }

    /// Activates HTML the host already holds and records it like a scrape.
    pub fn ingest(&self, raw: &RawPage) -> Response {
        let label = raw.requested_url.to_string();
        let inbound = Message::new(Role::User, format!("{SCRAPE_PREFIX} {label}"), false);

        let response = match extract_with_config(raw, &self.extract) {
            Ok(document) => scraped(&self.store.set_active(document, label)),
            Err(err) => {
                tracing::warn!(url = %raw.requested_url, error = %err, "ingest failed");
                Response::error(&ScrapeError::from(err))
            }
        };

        self.record_exchange(inbound, &response);
        response
    }

    /// Answers `question` against a snapshot of the active source.
    pub fn answer(&self, question: &str) -> Response {
        let source = self.store.get_active();
        let result = self.resolver.answer(question, source.as_deref());

        let mut response = Response::new(result.answer_text, ResponseKind::Answer, source.as_deref());
        response.confidence = Some(result.confidence);
        response
    }

    /// Describes the active source, or says there is none.
    pub fn show_source(&self) -> Response {
        let Some(source) = self.store.get_active() else {
            return Response::new(NO_SOURCE_MESSAGE, ResponseKind::Source, None);
        };

        let doc = &source.document;
        let mut lines = vec![
            format!("Current source: {}", source.display_title()),
            format!("URL: {}", source.url),
        ];
        if doc.url.trim_end_matches('/') != source.url.trim_end_matches('/') {
            lines.push(format!("Resolved to: {}", doc.url));
        }
        if let Some(description) = &doc.description {
            lines.push(format!("Description: {description}"));
        }
        lines.push(format!("Fetched at: {}", source.fetched_at_display()));
        lines.push(counts(&source));

        Response::new(lines.join("\n"), ResponseKind::Source, Some(&source))
    }

    /// Snapshot of the conversation so far.
    pub fn history(&self) -> Vec<Message> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Snapshot of the active source.
    pub fn active_source(&self) -> Option<Arc<Source>> {
        self.store.get_active()
    }

    /// Drops the active source.
    pub fn reset_source(&self) {
        self.store.reset();
    }

    /// Cancels any in-flight scrape; later scrapes fail with `Cancelled`.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    fn record_exchange(&self, inbound: Message, response: &Response) {
        let reply = Message::new(Role::Bot, response.text.clone(), response.is_error());
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(inbound);
        history.push(reply);
    }
}

fn counts(source: &Source) -> String {
    let doc = &source.document;
    format!(
        "{} headings, {} paragraphs, {} links",
        doc.headings.len(),
        doc.paragraphs.len(),
        doc.links.len()
    )
}

fn scraped(source: &Source) -> Response {
    let text = format!(
        "Scraped \"{}\": {}. Ask me anything about it.",
        source.display_title(),
        counts(source)
    );
    Response::new(text, ResponseKind::Scraped, Some(source))
}
