//! Single-slot holder for the session's active source.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::document::Document;

/// The active [`Document`] plus where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub document: Document,
    /// URL as the user typed it; the document carries the post-redirect URL.
    pub url: String,
}

/// Provenance summary handed to hosts alongside responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMeta {
    pub url: String,
    pub title: String,
    pub fetched_at: String,
}

impl Source {
    pub fn new(document: Document, url: impl Into<String>) -> Self {
        Self { document, url: url.into() }
    }

    /// The page title, or the URL when the page has none.
    pub fn display_title(&self) -> &str {
        self.document.title.as_deref().unwrap_or(&self.url)
    }

    /// Fetch time as RFC 3339.
    pub fn fetched_at_display(&self) -> String {
        self.document
            .fetched_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.document.fetched_at.to_string())
    }

    pub fn meta(&self) -> SourceMeta {
        SourceMeta {
            url: self.url.clone(),
            title: self.display_title().to_string(),
            fetched_at: self.fetched_at_display(),
        }
    }
}

/// Holds at most one [`Source`].
///
/// The slot stores an `Arc` that is swapped as a whole, so a reader holding a
/// snapshot never observes a half-replaced source.
#[derive(Debug, Default)]
pub struct SourceStore {
    active: RwLock<Option<Arc<Source>>>,
}

impl SourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous source with `doc`.
    pub fn set_active(&self, doc: Document, url: impl Into<String>) -> Arc<Source> {
        let source = Arc::new(Source::new(doc, url));
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&source));
        source
    }

    /// Snapshot of the current source.
    pub fn get_active(&self) -> Option<Arc<Source>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Forgets the active source.
    pub fn reset(&self) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
