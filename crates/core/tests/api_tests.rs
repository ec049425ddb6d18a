//! Library API integration tests
use pagechat_core::*;
use url::Url;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn load(name: &str, url: &str) -> RawPage {
    let html = std::fs::read_to_string(get_fixture_path(name)).unwrap();
    RawPage::from_html(Url::parse(url).unwrap(), html)
}

#[test]
fn test_extract_api() {
    let doc = extract(&load("pricing.html", "https://acme.example/")).expect("should extract");

    assert_eq!(doc.title.as_deref(), Some("Acme Widgets | Plans"));
    assert_eq!(doc.description.as_deref(), Some("Simple pricing for teams of every size."));
    assert_eq!(doc.url, "https://acme.example/");
}

#[test]
fn test_extract_headings_in_order() {
    let doc = extract(&load("pricing.html", "https://acme.example/")).unwrap();
    let headings: Vec<_> = doc.headings.iter().map(|h| (h.level, h.text.as_str())).collect();

    assert_eq!(
        headings,
        vec![
            (1, "Acme Widgets"),
            (2, "Pricing"),
            (2, "Refund policy"),
            (3, "Exceptions"),
            (2, "Contact"),
        ]
    );
}

#[test]
fn test_extract_skips_hidden_and_non_content() {
    let doc = extract(&load("pricing.html", "https://acme.example/")).unwrap();
    let all = doc.paragraphs.join("\n");

    assert!(!all.contains("Internal note"));
    assert!(!all.contains("Enable JavaScript"));
    assert!(!all.contains("$8/month"));
    assert!(!all.contains("analytics"));
    assert!(all.contains("© 2024 Acme Widgets"));
}

#[test]
fn test_extract_resolves_links_against_base() {
    let doc = extract(&load("pricing.html", "https://acme.example/plans/index.html")).unwrap();
    let hrefs: Vec<_> = doc.links.iter().map(|l| l.href.as_str()).collect();

    assert_eq!(
        hrefs,
        vec![
            "https://acme.example/",
            "https://acme.example/docs",
            "mailto:hello@acme.example",
            "https://acme.example/plans/contact.html",
            "https://acme.example/plans/index.html#top",
        ]
    );
}

#[test]
fn test_empty_content_fixture() {
    let result = extract(&load("empty_content.html", "https://acme.example/"));
    assert_eq!(result, Err(ExtractError::EmptyOrUnparsable));
}

#[test]
fn test_document_json() {
    let doc = extract(&load("pricing.html", "https://acme.example/")).unwrap();
    let json = doc.to_json().unwrap();

    assert!(json.is_object());
    assert_eq!(json["title"], "Acme Widgets | Plans");
    assert_eq!(json["headings"][1]["text"], "Pricing");
    assert!(json["fetched_at"].is_string());
}

#[test]
fn test_resolver_against_fixture() {
    let doc = extract(&load("handbook.html", "https://acme.example/handbook")).unwrap();
    let source = Source::new(doc, "https://acme.example/handbook");
    let resolver = QueryResolver::new(ResolverConfig { max_answer_chars: 200, ..Default::default() });

    let result = resolver.answer("Notes for topic 17", Some(&source));

    let section = result.matched_section.unwrap();
    assert_eq!(section.heading.as_deref(), Some("Notes for topic 17"));
    assert!(section.excerpt.contains("Default value is 17."));
    assert!(result.answer_text.chars().count() <= 200);
}

#[test]
fn test_store_and_resolve() {
    let store = SourceStore::new();
    let doc = extract(&load("pricing.html", "https://acme.example/")).unwrap();
    store.set_active(doc, "https://acme.example/");

    let active = store.get_active();
    let result = QueryResolver::default().answer("How much does it cost?", active.as_deref());
    assert!(result.answer_text.contains("$10/month"));
    assert_eq!(result.matched_section.unwrap().heading.as_deref(), Some("Pricing"));
}

#[test]
fn test_table_rows_and_nested_headings_fixture() {
    let doc = extract(&load("plans_table.html", "https://acme.example/plans")).unwrap();
    let headings: Vec<_> = doc.headings.iter().map(|h| (h.level, h.text.as_str())).collect();

    assert_eq!(
        headings,
        vec![
            (1, "Compare plans"),
            (2, "Prices"),
            (2, "Add-ons"),
            (3, "Extra storage"),
            (3, "Priority support"),
            (2, "Office hours"),
        ]
    );
    assert_eq!(
        doc.paragraphs,
        vec![
            "Every plan includes unlimited projects.",
            "Plan: Silver, Monthly: $19, Seats: 5",
            "Plan: Gold, Monthly: $49, Seats: 25",
            "Adds 100 GB for $5 per month.",
            "Answers within one hour.",
            "Open Monday to Friday Closed on weekends",
            "Phone: 555-0100",
        ]
    );
}

#[test]
fn test_answer_from_table_row() {
    let doc = extract(&load("plans_table.html", "https://acme.example/plans")).unwrap();
    let source = Source::new(doc, "https://acme.example/plans");

    let result = QueryResolver::default().answer("gold monthly", Some(&source));

    assert!(result.answer_text.contains("$49"));
    assert!(result.confidence > 0.0);
}

#[test]
fn test_answer_from_heading_inside_list_item() {
    let doc = extract(&load("plans_table.html", "https://acme.example/plans")).unwrap();
    let source = Source::new(doc, "https://acme.example/plans");

    let result = QueryResolver::default().answer("extra storage", Some(&source));

    assert_eq!(result.matched_section.unwrap().heading.as_deref(), Some("Extra storage"));
    assert_eq!(result.answer_text, "Adds 100 GB for $5 per month.");
}
