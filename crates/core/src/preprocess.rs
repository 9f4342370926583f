use std::sync::LazyLock;

use regex::Regex;

static XML_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<\?xml [^>]+?\?>").expect("valid xml declaration regex"));

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script tags
    pub remove_scripts: bool,
    /// Whether to remove style tags
    pub remove_styles: bool,
    /// Whether to remove noscript tags
    pub remove_noscript: bool,
    /// Whether to remove iframe, svg, canvas and template tags
    pub remove_embedded: bool,
    /// Whether to remove markup comments
    pub remove_comments: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_scripts: true, remove_styles: true, remove_noscript: true, remove_embedded: true, remove_comments: true }
    }
}

impl PreprocessConfig {
    fn removed_tags(&self) -> Vec<&'static str> {
        let mut tags = Vec::new();
        if self.remove_scripts {
            tags.push("script");
        }
        if self.remove_styles {
            tags.push("style");
        }
        if self.remove_noscript {
            tags.push("noscript");
        }
        if self.remove_embedded {
            tags.extend(["iframe", "svg", "canvas", "template"]);
        }
        tags
    }
}

/// Strips markup that never carries visible page text before the page is
/// rendered by the content oracle.
///
/// A leading XML declaration is always dropped.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = XML_DECLARATION.replace(html, "").into_owned();

    let tags = config.removed_tags();
    if !tags.is_empty() {
        processed = remove_tags(&processed, &tags);
    }

    if config.remove_comments {
        processed = remove_comments(&processed);
    }

    processed
}

/// Removes every element named in `tags`, including its content.
fn remove_tags(html: &str, tags: &[&str]) -> String {
    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: tags
                .iter()
                .map(|tag| {
                    lol_html::element!(*tag, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}

/// Remove HTML comments from the document
fn remove_comments(html: &str) -> String {
    COMMENTS.replace_all(html, "").into_owned()
}
