//! HTML to [`Document`] extraction.
//!
//! The page is preprocessed, parsed once, and walked recursively in document
//! order. Headings, paragraph-like blocks, table rows and anchors each land in
//! their own ordered list; headings record how many paragraphs precede them so
//! sections can be rebuilt later.
//!
//! A paragraph-like block that wraps other blocks (a list item holding a
//! heading, say) is treated as a container: its nested blocks are walked in
//! place and its loose text becomes paragraphs between them.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::Selector;
use url::Url;

use crate::document::{Document, Heading, Link};
use crate::error::ExtractError;
use crate::fetch::RawPage;
use crate::parse::{Child, Element, HtmlPage, TextBuilder};
use crate::preprocess::PreprocessConfig;

const PARAGRAPH_TAGS: &[&str] = &["p", "li", "blockquote", "pre", "dd", "figcaption"];

static BLOCK: LazyLock<Selector> = LazyLock::new(|| {
    let tags = format!("h1, h2, h3, h4, h5, h6, table, {}", PARAGRAPH_TAGS.join(", "));
    Selector::parse(&tags).expect("valid block selector")
});
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum character count for a paragraph to be kept
    pub min_paragraph_chars: usize,
    /// Preprocessing applied before parsing
    pub preprocess: PreprocessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { min_paragraph_chars: 1, preprocess: PreprocessConfig::default() }
    }
}

/// Extracts a [`Document`] from a fetched page using default settings.
pub fn extract(raw: &RawPage) -> Result<Document, ExtractError> {
    extract_with_config(raw, &ExtractConfig::default())
}

/// Extracts a [`Document`] from a fetched page.
///
/// Fails with [`ExtractError::EmptyOrUnparsable`] when the body is blank or
/// nothing at all could be pulled out of it.
pub fn extract_with_config(raw: &RawPage, config: &ExtractConfig) -> Result<Document, ExtractError> {
    if raw.body.trim().is_empty() {
        return Err(ExtractError::EmptyOrUnparsable);
    }

    let page = HtmlPage::parse_with_preprocessing(&raw.body, &config.preprocess);
    let mut builder = DocumentBuilder::new(&raw.final_url, config.min_paragraph_chars);

    builder.walk(&page.root());

    let document = builder.finish(page.title(), page.description(), raw);

    if document.is_empty() {
        tracing::debug!(url = %raw.final_url, "page yielded no content");
        return Err(ExtractError::EmptyOrUnparsable);
    }

    tracing::debug!(
        url = %document.url,
        headings = document.headings.len(),
        paragraphs = document.paragraphs.len(),
        links = document.links.len(),
        "extracted document"
    );

    Ok(document)
}

/// Accumulates ordered content while walking the page.
struct DocumentBuilder<'u> {
    base: &'u Url,
    min_paragraph_chars: usize,
    headings: Vec<Heading>,
    paragraphs: Vec<String>,
    links: Vec<Link>,
    seen_links: HashSet<(String, String)>,
}

impl<'u> DocumentBuilder<'u> {
    fn new(base: &'u Url, min_paragraph_chars: usize) -> Self {
        Self {
            base,
            min_paragraph_chars,
            headings: Vec::new(),
            paragraphs: Vec::new(),
            links: Vec::new(),
            seen_links: HashSet::new(),
        }
    }

    fn walk(&mut self, element: &Element<'_>) {
        if let Some(level) = element.heading_level() {
            self.push_heading(level, element.text());
            self.push_links_within(element);
            return;
        }

        let tag = element.tag_name();
        let paragraph_like = PARAGRAPH_TAGS.contains(&tag);

        if (paragraph_like || tag == "table") && !element.has_descendant(&BLOCK) {
            if paragraph_like {
                self.push_paragraph(element.text());
                self.push_links_within(element);
            } else {
                self.push_table(element);
            }
        } else if paragraph_like {
            self.push_container(element);
        } else {
            if tag == "a" {
                self.push_link(element);
            }
            for child in element.child_elements() {
                self.walk(&child);
            }
        }
    }

    /// Walks a paragraph-like block that wraps other blocks.
    fn push_container(&mut self, element: &Element<'_>) {
        let mut loose = TextBuilder::default();

        for child in element.children() {
            match child {
                Child::Text(text) => loose.push_text(text),
                Child::Element(child) if child.matches(&BLOCK) || child.has_descendant(&BLOCK) => {
                    self.push_paragraph(loose.take());
                    self.walk(&child);
                }
                Child::Element(child) => {
                    loose.push_element(&child);
                    self.push_links_within(&child);
                }
            }
        }

        self.push_paragraph(loose.take());
    }

    /// Emits one paragraph per table row, cells labelled by a leading all-`th` header row.
    fn push_table(&mut self, table: &Element<'_>) {
        let mut header = Vec::new();
        let mut rows = 0;

        for part in table.child_elements() {
            match part.tag_name() {
                "caption" => self.push_paragraph(part.text()),
                "tr" => rows += self.push_row(&part, &mut header),
                "thead" | "tbody" | "tfoot" => {
                    for row in part.child_elements().filter(|row| row.tag_name() == "tr") {
                        rows += self.push_row(&row, &mut header);
                    }
                }
                _ => {}
            }
        }

        if rows == 0 && !header.is_empty() {
            self.push_paragraph(header.join(", "));
        }
        self.push_links_within(table);
    }

    fn push_row(&mut self, row: &Element<'_>, header: &mut Vec<String>) -> usize {
        let cells: Vec<_> = row.child_elements().filter(|cell| matches!(cell.tag_name(), "td" | "th")).collect();
        if cells.is_empty() {
            return 0;
        }
        if header.is_empty() && cells.iter().all(|cell| cell.tag_name() == "th") {
            *header = cells.iter().map(Element::text).collect();
            return 0;
        }

        let values: Vec<_> = cells.iter().map(Element::text).collect();
        self.push_paragraph(row_text(header, &values));
        1
    }

    fn push_heading(&mut self, level: u8, text: String) {
        if text.is_empty() {
            return;
        }
        self.headings.push(Heading { level, text, position: self.paragraphs.len() });
    }

    fn push_paragraph(&mut self, text: String) {
        if text.is_empty() || text.chars().count() < self.min_paragraph_chars {
            return;
        }
        let heading_since_last = self.headings.last().is_some_and(|h| h.position == self.paragraphs.len());
        if !heading_since_last && self.paragraphs.last() == Some(&text) {
            return;
        }
        self.paragraphs.push(text);
    }

    fn push_links_within(&mut self, element: &Element<'_>) {
        if element.tag_name() == "a" {
            self.push_link(element);
        }
        for link in element.descendants_matching(&LINK) {
            self.push_link(&link);
        }
    }

    fn push_link(&mut self, element: &Element<'_>) {
        let text = element.text();
        let href = element.attr("href").map(str::trim).unwrap_or_default();
        if text.is_empty() || href.is_empty() {
            return;
        }

        let Ok(resolved) = self.base.join(href) else {
            tracing::debug!(href, "dropping unresolvable link");
            return;
        };

        let key = (resolved.to_string(), text);
        if self.seen_links.insert(key.clone()) {
            let (href, text) = key;
            self.links.push(Link { text, href });
        }
    }

    fn finish(self, title: Option<String>, description: Option<String>, raw: &RawPage) -> Document {
        Document {
            url: raw.final_url.to_string(),
            title,
            description,
            headings: self.headings,
            paragraphs: self.paragraphs,
            links: self.links,
            fetched_at: raw.fetched_at,
        }
    }
}

/// `Header: value` pairs joined by commas; unlabelled or blank-header cells stay bare.
fn row_text(header: &[String], values: &[String]) -> String {
    values
        .iter()
        .enumerate()
        .filter(|(_, value)| !value.is_empty())
        .map(|(i, value)| match header.get(i) {
            Some(label) if !label.is_empty() && label != value => format!("{label}: {value}"),
            _ => value.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
