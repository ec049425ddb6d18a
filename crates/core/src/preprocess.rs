use std::sync::LazyLock;

use regex::Regex;

/// Elements whose content is never visible page text.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "canvas", "template"];

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment pattern"));
static HIDDEN_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("valid hidden style pattern")
});

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to drop script, style, noscript, iframe, svg, canvas and template elements
    pub remove_non_content: bool,
    /// Whether to strip HTML comments
    pub remove_comments: bool,
    /// Whether to drop elements hidden by `hidden` or inline styles
    pub remove_hidden: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_non_content: true, remove_comments: true, remove_hidden: true }
    }
}

/// Preprocess HTML by removing markup that never contributes readable text
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = html.to_string();

    if config.remove_non_content {
        processed = remove_non_content_tags(&processed);
    }

    if config.remove_comments {
        processed = remove_comments(&processed);
    }

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    processed
}

/// Runs a lol_html rewrite, falling back to the input when rewriting fails
fn rewrite(html: &str, settings: lol_html::Settings<'_, '_>) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(settings, |c: &[u8]| {
        output.push_str(&String::from_utf8_lossy(c));
    });

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        tracing::debug!("html rewrite failed, keeping original markup");
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

/// Remove script, style and other non-content elements together with their content
fn remove_non_content_tags(html: &str) -> String {
    let handlers = NON_CONTENT_TAGS
        .iter()
        .map(|tag| {
            lol_html::element!(*tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    rewrite(html, lol_html::Settings { element_content_handlers: handlers, ..Default::default() })
}

/// Remove HTML comments from the document
fn remove_comments(html: &str) -> String {
    COMMENT.replace_all(html, "").to_string()
}

/// Remove elements with the `hidden` attribute, display:none or visibility:hidden
fn remove_hidden_elements(html: &str) -> String {
    rewrite(
        html,
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("*", |el| {
                if el.has_attribute("hidden") {
                    el.remove();
                    return Ok(());
                }
                if let Some(style) = el.get_attribute("style")
                    && HIDDEN_STYLE.is_match(&style)
                {
                    el.remove();
                }
                Ok(())
            })],
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_non_content_tags() {
        let html = r#"
            <html>
                <head><script>alert('test');</script><style>body{color:red;}</style></head>
                <body>
                    <noscript>Enable JavaScript</noscript>
                    <iframe src="https://example.com"></iframe>
                    <svg><rect width="100" height="100"/></svg>
                    <canvas id="chart"></canvas>
                    <template><p>Later</p></template>
                    <p>Content</p>
                </body>
            </html>
        "#;

        let result = remove_non_content_tags(html);
        assert!(!result.contains("alert"), "Script content should be removed");
        assert!(!result.contains("color:red"), "Style content should be removed");
        assert!(!result.contains("Enable JavaScript"));
        assert!(!result.contains("example.com"));
        assert!(!result.contains("rect"));
        assert!(!result.contains("chart"));
        assert!(!result.contains("Later"));
        assert!(result.contains("<p>Content</p>"));
    }

    #[test]
    fn test_remove_comments() {
        let html = "<body><!-- one --><p>Visible content</p><!--\nmulti\nline\n--></body>";

        let result = remove_comments(html);
        assert!(!result.contains("<!--"));
        assert!(!result.contains("multi"));
        assert!(result.contains("Visible content"));
    }

    #[test]
    fn test_remove_hidden_elements() {
        let html = r#"
            <body>
                <div style="display: none">Hidden by style</div>
                <p hidden>Hidden by attribute</p>
                <p style="color: blue">Shown</p>
            </body>
        "#;

        let result = remove_hidden_elements(html);
        assert!(!result.contains("Hidden by style"));
        assert!(!result.contains("Hidden by attribute"));
        assert!(result.contains("Shown"));
    }

    #[test]
    fn test_preprocess_respects_config() {
        let html = "<body><script>x()</script><!-- c --><p>Text</p></body>";
        let config = PreprocessConfig { remove_non_content: false, ..Default::default() };

        let result = preprocess_html(html, &config);
        assert!(result.contains("x()"));
        assert!(!result.contains("<!--"));
    }
}
