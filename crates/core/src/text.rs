//! Text normalization shared by the extractor and the query resolver.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid word pattern"));

/// Words that carry no signal when matching a question against page text.
const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be", "been", "being", "but", "by",
    "can", "could", "did", "do", "does", "doing", "for", "from", "get", "had", "has", "have", "he", "her", "here",
    "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "much", "many", "my", "of", "on",
    "or", "our", "please", "s", "she", "should", "so", "some", "tell", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "us", "was", "we", "were", "what", "when", "where", "which",
    "who", "whom", "why", "will", "with", "would", "you", "your",
];

/// Trims and collapses every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased words with punctuation stripped, in order, stop-words included.
pub fn words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

/// Distinct content terms of `text`: stop-words removed, suffixes stemmed.
pub fn terms(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .map(|w| stem(&w))
        .collect()
}

/// Strips a handful of common English suffixes so `costs` meets `cost`.
pub fn stem(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 || !word.is_ascii() {
        return word.to_string();
    }

    if let Some(base) = word.strip_suffix("ies")
        && base.len() >= 2
    {
        return format!("{base}y");
    }
    if let Some(base) = word.strip_suffix("ing")
        && base.len() >= 3
    {
        return base.to_string();
    }
    if let Some(base) = word.strip_suffix("ed")
        && base.len() >= 3
    {
        return base.to_string();
    }
    if let Some(base) = word.strip_suffix("es")
        && ["s", "x", "z", "ch", "sh"].iter().any(|s| base.ends_with(s))
    {
        return base.to_string();
    }
    if word.ends_with('s') && !(word.ends_with("ss") || word.ends_with("us") || word.ends_with("is")) {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

/// Fraction of `query` terms that also occur in `candidate`.
pub fn overlap(query: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let shared = query.intersection(candidate).count();
    (shared as f64 / query.len() as f64).clamp(0.0, 1.0)
}

/// Shortens `text` to at most `max_chars` characters, ellipsis included.
///
/// The cut lands on whitespace so no word is split; a single word longer than
/// the whole budget is the only case that gets cut mid-word. A zero bound
/// leaves nothing, not even the ellipsis.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let budget = max_chars.saturating_sub(1);
    let cut = text.char_indices().nth(budget).map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];

    let head = if text[cut..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(i) if !head[..i].trim().is_empty() => &head[..i],
            _ => head,
        }
    };

    format!("{}…", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Hello \n\t  world  "), "Hello world");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_words_strip_punctuation() {
        assert_eq!(words("Our plan costs $10/month!"), vec!["our", "plan", "costs", "10", "month"]);
    }

    #[test]
    fn test_terms_drop_stop_words() {
        let t = terms("How much does it cost?");
        assert_eq!(t.into_iter().collect::<Vec<_>>(), vec!["cost".to_string()]);
    }

    #[rstest]
    #[case("costs", "cost")]
    #[case("pricing", "pric")]
    #[case("priced", "pric")]
    #[case("policies", "policy")]
    #[case("boxes", "box")]
    #[case("class", "class")]
    #[case("status", "status")]
    #[case("bus", "bus")]
    #[case("café", "café")]
    fn test_stem(#[case] word: &str, #[case] expected: &str) {
        assert_eq!(stem(word), expected);
    }

    #[test]
    fn test_overlap() {
        let q = terms("refund policy window");
        let h = terms("Refund Policies");
        assert!((overlap(&q, &h) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(overlap(&BTreeSet::new(), &h), 0.0);
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate_at_word("short text", 50), "short text");
    }

    #[test]
    fn test_truncate_on_word_boundary() {
        let out = truncate_at_word("alpha beta gamma delta", 13);
        assert_eq!(out, "alpha beta…");
        assert!(out.chars().count() <= 13);
    }

    #[test]
    fn test_truncate_exact_boundary() {
        assert_eq!(truncate_at_word("alpha beta gamma", 11), "alpha beta…");
    }

    #[rstest]
    #[case(0, "")]
    #[case(1, "…")]
    #[case(2, "a…")]
    fn test_truncate_tiny_bounds(#[case] max_chars: usize, #[case] expected: &str) {
        let out = truncate_at_word("alpha beta", max_chars);
        assert_eq!(out, expected);
        assert!(out.chars().count() <= max_chars);
    }

    #[test]
    fn test_truncate_multibyte() {
        let out = truncate_at_word("ünïcödé wörds everywhere here", 10);
        assert_eq!(out, "ünïcödé…");
    }
}
