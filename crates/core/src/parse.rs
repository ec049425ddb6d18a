//! HTML parsing and DOM access.
//!
//! [`HtmlPage`] wraps a `scraper` document and [`Element`] wraps a single node.
//! They expose just enough of the DOM for the extractor: ordered selection,
//! child traversal, normalized text, attributes and a couple of meta lookups.
//!
//! Text is gathered node by node rather than glued together, so `<br>`, block
//! boundaries and punctuation-ended inline runs keep their words apart.
//!
//! # Example
//!
//! ```rust
//! use pagechat_core::parse::HtmlPage;
//! use scraper::Selector;
//!
//! let page = HtmlPage::parse("<html><head><title> Test </title></head><body><p>Hi</p></body></html>");
//! assert_eq!(page.title(), Some("Test".to_string()));
//!
//! let p = Selector::parse("p").unwrap();
//! assert_eq!(page.select(&p).next().unwrap().text(), "Hi");
//! ```

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::text::collapse_whitespace;

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

/// Elements whose edges always separate words.
const BREAKING_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "caption", "dd", "details", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Characters that attach to the word before them.
const CLOSING_PUNCTUATION: &str = ".,;:!?)]}%";
/// Characters that attach to the word after them.
const OPENING_PUNCTUATION: &str = "([{$";
/// An inline run ending in one of these starts a new word at the next run.
const SENTENCE_PUNCTUATION: &str = ".,;:!?";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Boundary {
    #[default]
    None,
    Inline,
    Breaking,
}

/// Joins text runs from several nodes into one collapsed string.
#[derive(Debug, Default)]
pub(crate) struct TextBuilder {
    buf: String,
    boundary: Boundary,
}

impl TextBuilder {
    /// Appends a text node, inserting a space when the pending element edge separates words.
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.needs_space(text) {
            self.buf.push(' ');
        }
        self.boundary = Boundary::None;
        self.buf.push_str(text);
    }

    /// Appends all text under `element`, with its edges treated as boundaries.
    pub(crate) fn push_element(&mut self, element: &Element<'_>) {
        self.collect(element.element);
    }

    /// Collapsed text gathered so far; the builder is left empty.
    pub(crate) fn take(&mut self) -> String {
        self.boundary = Boundary::None;
        collapse_whitespace(&std::mem::take(&mut self.buf))
    }

    fn collect(&mut self, element: ElementRef<'_>) {
        let edge = if BREAKING_TAGS.contains(&element.value().name()) { Boundary::Breaking } else { Boundary::Inline };

        self.boundary = self.boundary.max(edge);
        for node in element.children() {
            match node.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(node) {
                        self.collect(child);
                    }
                }
                _ => {}
            }
        }
        self.boundary = self.boundary.max(edge);
    }

    fn needs_space(&self, next: &str) -> bool {
        let (Some(before), Some(after)) = (self.buf.chars().next_back(), next.chars().next()) else {
            return false;
        };
        if before.is_whitespace() || after.is_whitespace() || CLOSING_PUNCTUATION.contains(after) {
            return false;
        }
        match self.boundary {
            Boundary::None => false,
            Boundary::Inline => SENTENCE_PUNCTUATION.contains(before),
            Boundary::Breaking => !OPENING_PUNCTUATION.contains(before),
        }
    }
}

/// A direct child of an [`Element`]: a text run or another element.
#[derive(Clone, Debug)]
pub enum Child<'a> {
    Text(&'a str),
    Element(Element<'a>),
}

/// A parsed HTML page.
pub struct HtmlPage {
    html: Html,
}

impl HtmlPage {
    /// Parses HTML as-is. Parsing is error tolerant and never fails.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Strips non-content markup first, then parses.
    pub fn parse_with_preprocessing(html: &str, config: &PreprocessConfig) -> Self {
        let cleaned = preprocess_html(html, config);
        Self::parse(&cleaned)
    }

    /// Gets the underlying `scraper::Html`.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The `<html>` element.
    pub fn root(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Selects elements matching `selector`, in document order.
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = Element<'a>> + 'a {
        self.html.select(selector).map(|element| Element { element })
    }

    /// Text of the first `<title>`, whitespace-collapsed; `None` when absent or blank.
    pub fn title(&self) -> Option<String> {
        self.html
            .select(&TITLE)
            .next()
            .map(|element| Element { element }.text())
            .filter(|t| !t.is_empty())
    }

    /// Content of `<meta name=key>` or `<meta property=key>`, if non-blank.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        ["name", "property"].iter().find_map(|attr| {
            let selector = Selector::parse(&format!("meta[{attr}=\"{key}\"]")).ok()?;
            self.html
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(collapse_whitespace)
                .filter(|c| !c.is_empty())
        })
    }

    /// Page description from `description`, falling back to `og:description`.
    pub fn description(&self) -> Option<String> {
        self.meta_content("description").or_else(|| self.meta_content("og:description"))
    }

    /// All text in the document, whitespace-collapsed.
    pub fn text_content(&self) -> String {
        self.root().text()
    }
}

/// A single element of an [`HtmlPage`].
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Visible text, trimmed with whitespace runs collapsed.
    pub fn text(&self) -> String {
        let mut text = TextBuilder::default();
        text.push_element(self);
        text.take()
    }

    /// Direct children in document order; comments and other node kinds are skipped.
    pub fn children(&self) -> impl Iterator<Item = Child<'a>> {
        self.element.children().filter_map(|node| match node.value() {
            Node::Text(text) => Some(Child::Text(&**text)),
            Node::Element(_) => ElementRef::wrap(node).map(|element| Child::Element(Element { element })),
            _ => None,
        })
    }

    /// Direct child elements in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = Element<'a>> {
        self.children().filter_map(|child| match child {
            Child::Element(element) => Some(element),
            Child::Text(_) => None,
        })
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Lowercase tag name.
    pub fn tag_name(&self) -> &'a str {
        self.element.value().name()
    }

    /// Level 1-6 when this element is `h1`..`h6`.
    pub fn heading_level(&self) -> Option<u8> {
        match self.tag_name() {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// True when this element itself matches `selector`.
    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.element)
    }

    /// True when any descendant (not the element itself) matches `selector`.
    pub fn has_descendant(&self, selector: &Selector) -> bool {
        self.element.select(selector).any(|el| el.id() != self.element.id())
    }

    /// Descendants (not the element itself) matching `selector`, in document order.
    pub fn descendants_matching(&self, selector: &Selector) -> Vec<Element<'a>> {
        self.element
            .select(selector)
            .filter(|el| el.id() != self.element.id())
            .map(|element| Element { element })
            .collect()
    }
}
