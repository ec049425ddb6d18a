//! The normalized page model produced by the extractor.
//!
//! A [`Document`] is a flat, ordered view of a page: its title, the headings in
//! document order, the paragraph-like text blocks, and the outbound links.
//! Headings remember where their content starts in the paragraph list so the
//! query resolver can recover sections without keeping the DOM around.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A heading element (`h1`..`h6`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Trimmed, whitespace-collapsed text.
    pub text: String,
    /// Index into [`Document::paragraphs`] of the first paragraph after this heading.
    pub position: usize,
}

/// An anchor with a resolved, absolute href.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// Structural extraction of a single web page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Final URL of the page, after redirects.
    pub url: String,
    pub title: Option<String>,
    /// Meta description, when the page declares one.
    pub description: Option<String>,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub links: Vec<Link>,
    #[serde(with = "time::serde::rfc3339")]
    pub fetched_at: OffsetDateTime,
}

impl Document {
    /// Paragraphs belonging to the heading at `index`.
    ///
    /// A section runs from the heading to the next heading of equal or higher
    /// level (numerically lower or equal), or to the end of the document, so
    /// nested sub-sections are included.
    pub fn section(&self, index: usize) -> &[String] {
        let Some(heading) = self.headings.get(index) else {
            return &[];
        };

        let end = self.headings[index + 1..]
            .iter()
            .find(|h| h.level <= heading.level)
            .map_or(self.paragraphs.len(), |h| h.position);

        let start = heading.position.min(self.paragraphs.len());
        &self.paragraphs[start..end.clamp(start, self.paragraphs.len())]
    }

    /// The closest heading preceding the paragraph at `paragraph`, if any.
    pub fn heading_for_paragraph(&self, paragraph: usize) -> Option<&Heading> {
        self.headings.iter().rev().find(|h| h.position <= paragraph)
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.headings.is_empty() && self.paragraphs.is_empty() && self.links.is_empty()
    }

    /// Serializes the document as a JSON value.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
