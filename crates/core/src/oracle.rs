//! Reference content.
//!
//! Post inference needs an independent view of what the page's readable text
//! is. A [`ContentOracle`] turns raw markup into ordered text lines; the
//! default [`PageTextOracle`] renders the page the way a text browser would:
//! block elements start new lines, inline elements flow together and
//! invisible markup is dropped.
//!
//! Any `Fn(&str) -> Vec<String>` is an oracle as well, which keeps tests and
//! alternative extractors simple:
//!
//! ```rust
//! use harvest_core::oracle::ContentOracle;
//!
//! let fixed = |_: &str| vec!["first line".to_string()];
//! assert_eq!(fixed.extract_main_text("<p>ignored</p>"), vec!["first line"]);
//! ```

use ego_tree::iter::Edge;
use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};

use crate::preprocess::{PreprocessConfig, preprocess_html};

/// Source of reference text fragments for a page.
pub trait ContentOracle: Send + Sync {
    /// Ordered text fragments of the page. May be empty.
    fn extract_main_text(&self, html: &str) -> Vec<String>;
}

impl<F> ContentOracle for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn extract_main_text(&self, html: &str) -> Vec<String> {
        self(html)
    }
}

const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template", "title"];

// Table cells are rendered as blocks so every cell anchors on its own line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "details", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "html", "li", "main",
    "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Renders the visible page text line by line.
#[derive(Debug, Clone, Default)]
pub struct PageTextOracle {
    preprocess: PreprocessConfig,
}

impl PageTextOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocess_config(preprocess: PreprocessConfig) -> Self {
        Self { preprocess }
    }
}

impl ContentOracle for PageTextOracle {
    fn extract_main_text(&self, html: &str) -> Vec<String> {
        let cleaned = preprocess_html(html, &self.preprocess);
        let document = Html::parse_document(&cleaned);

        let mut writer = LineWriter::default();
        render(document.tree.root(), &mut writer);
        writer.finish()
    }
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<String>,
    current: String,
}

impl LineWriter {
    fn push(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn line_break(&mut self) {
        let line = self.current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !line.is_empty() {
            self.lines.push(line);
        }
        self.current.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.line_break();
        self.lines
    }
}

/// Walks the tree with open/close edges, so nesting depth never grows the call stack.
fn render(root: NodeRef<'_, Node>, out: &mut LineWriter) {
    let mut skipped: Option<NodeId> = None;

    for edge in root.traverse() {
        match edge {
            Edge::Open(node) => {
                if skipped.is_some() {
                    continue;
                }
                match node.value() {
                    Node::Text(text) => out.push(text),
                    Node::Element(element) => {
                        let name = element.name();
                        if SKIPPED_TAGS.contains(&name) {
                            skipped = Some(node.id());
                        } else if name == "br" || BLOCK_TAGS.contains(&name) {
                            out.line_break();
                        }
                    }
                    _ => {}
                }
            }
            Edge::Close(node) => {
                if skipped == Some(node.id()) {
                    skipped = None;
                    continue;
                }
                if skipped.is_some() {
                    continue;
                }
                if let Node::Element(element) = node.value()
                    && BLOCK_TAGS.contains(&element.name())
                {
                    out.line_break();
                }
            }
        }
    }
}
