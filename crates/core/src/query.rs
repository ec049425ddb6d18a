//! Answering questions against the active source.
//!
//! Matching is lexical and deterministic. The question and the candidate text
//! are reduced to sets of stemmed content terms, and a candidate scores the
//! fraction of question terms it contains. Headings are tried first, and the
//! winning heading's section becomes the answer. Without any heading overlap
//! the single best paragraph is used, and failing that the answer is a short
//! overview of the page so a question never goes unanswered.

use serde::Serialize;

use crate::document::Document;
use crate::store::Source;
use crate::text::{overlap, terms, truncate_at_word};

/// Answer text returned when no page has been scraped yet.
pub const NO_CONTENT: &str = "no content scraped yet";

/// Tunables for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound on answer length in characters, ellipsis included.
    pub max_answer_chars: usize,
    /// Paragraphs quoted in the fallback overview.
    pub overview_paragraphs: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_answer_chars: 600, overview_paragraphs: 2 }
    }
}

/// The part of the page an answer came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedSection {
    /// Heading of the matched section, or the heading above the matched paragraph.
    pub heading: Option<String>,
    /// Untruncated excerpt text.
    pub excerpt: String,
}

/// Outcome of a single question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub matched_section: Option<MatchedSection>,
    pub answer_text: String,
    /// Winning overlap score in `[0, 1]`.
    pub confidence: f64,
}

impl QueryResult {
    fn no_content() -> Self {
        Self { matched_section: None, answer_text: NO_CONTENT.to_string(), confidence: 0.0 }
    }
}

/// Scores and selects page content for questions.
#[derive(Debug, Clone, Default)]
pub struct QueryResolver {
    config: ResolverConfig,
}

impl QueryResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Answers `question` from `source`. Never fails.
    pub fn answer(&self, question: &str, source: Option<&Source>) -> QueryResult {
        let Some(source) = source else {
            return QueryResult::no_content();
        };
        let doc = &source.document;
        let query = terms(question);

        if let Some((index, score)) = best_match(doc.headings.iter().map(|h| h.text.as_str()), &query) {
            let section = doc.section(index);
            if !section.is_empty() {
                tracing::debug!(heading = %doc.headings[index].text, score, "matched heading");
                return self.excerpt_result(Some(doc.headings[index].text.clone()), section.join("\n\n"), score);
            }
        }

        if let Some((index, score)) = best_match(doc.paragraphs.iter().map(String::as_str), &query) {
            tracing::debug!(paragraph = index, score, "matched paragraph");
            let heading = doc.heading_for_paragraph(index).map(|h| h.text.clone());
            return self.excerpt_result(heading, doc.paragraphs[index].clone(), score);
        }

        tracing::debug!("no lexical overlap, answering with overview");
        QueryResult {
            matched_section: None,
            answer_text: truncate_at_word(&self.overview(source), self.config.max_answer_chars),
            confidence: 0.0,
        }
    }

    fn excerpt_result(&self, heading: Option<String>, excerpt: String, score: f64) -> QueryResult {
        QueryResult {
            answer_text: truncate_at_word(&excerpt, self.config.max_answer_chars),
            matched_section: Some(MatchedSection { heading, excerpt }),
            confidence: score.clamp(0.0, 1.0),
        }
    }

    /// Title, opening paragraphs and content counts.
    fn overview(&self, source: &Source) -> String {
        let doc: &Document = &source.document;
        let mut parts = vec![source.display_title().to_string()];

        if let Some(description) = &doc.description {
            parts.push(description.clone());
        }
        parts.extend(doc.paragraphs.iter().take(self.config.overview_paragraphs).cloned());
        parts.push(format!(
            "The page has {} heading{} and {} link{}.",
            doc.headings.len(),
            plural(doc.headings.len()),
            doc.links.len(),
            plural(doc.links.len())
        ));

        parts.join("\n\n")
    }
}

/// Index and score of the best positive-scoring candidate, earliest on ties.
fn best_match<'a>(
    candidates: impl Iterator<Item = &'a str>, query: &std::collections::BTreeSet<String>,
) -> Option<(usize, f64)> {
    if query.is_empty() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (index, text) in candidates.enumerate() {
        let score = overlap(query, &terms(text));
        if score > 0.0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
