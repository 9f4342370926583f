//! HTML parsing and tree access.
//!
//! This module provides the [`Document`] and [`Element`] types the inference
//! engine walks. A document is parsed once per request and never mutated;
//! element handles are cheap copies that borrow from it.
//!
//! Text accessors follow the conventions the selector dialect relies on:
//!
//! - [`Element::own_text`] is the text before the first child node,
//! - [`Element::tail_text`] is the text after the element up to its next
//!   sibling node,
//! - [`Element::text`] joins every descendant text node, trimmed, with
//!   single spaces.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::parse::Document;
//!
//! let html = r#"<div class="post">Hello <b>world</b> again</div>"#;
//! let doc = Document::parse(html).unwrap();
//! let post = &doc.select("div.post").unwrap()[0];
//!
//! assert_eq!(post.own_text(), "Hello ");
//! assert_eq!(post.text(), "Hello world again");
//! ```

use std::collections::HashMap;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector as CssSelector};

use crate::selector::Selector;
use crate::{HarvestError, Result};

/// Represents a parsed HTML document.
///
/// Besides the tree itself, a document keeps the document-order position of
/// every node so that match sets can be returned in XPath order after steps
/// that reorder or duplicate nodes (child steps under nested matches,
/// ancestor steps).
pub struct Document {
    html: Html,
    order: HashMap<NodeId, usize>,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// Parsing is lenient: malformed markup is repaired by the HTML5 tree
    /// builder rather than rejected.
    ///
    /// # Example
    ///
    /// ```rust
    /// use harvest_core::parse::Document;
    ///
    /// let doc = Document::parse("<html><body><p>Hi</p></body></html>").unwrap();
    /// assert_eq!(doc.elements().count(), 4);
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        let order = html
            .tree
            .root()
            .descendants()
            .enumerate()
            .map(|(position, node)| (node.id(), position))
            .collect();

        Ok(Self { html, order })
    }

    /// Gets the raw HTML representation.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Iterates over every element of the document in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        self.html.tree.root().descendants().filter_map(ElementRef::wrap).map(Element::from)
    }

    /// Evaluates a structural selector against this document.
    ///
    /// The result is in document order and free of duplicates.
    pub fn query(&self, selector: &Selector) -> Vec<Element<'_>> {
        selector.evaluate(self)
    }

    /// Returns the text of every element matched by `selector`.
    pub fn query_texts(&self, selector: &Selector) -> Vec<String> {
        self.query(selector).iter().map(Element::text).collect()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = CssSelector::parse(selector)
            .map_err(|e| HarvestError::HtmlParseError(format!("Invalid selector: {}", e)))?;

        Ok(self.html.select(&sel).map(Element::from).collect())
    }

    /// Gets the title of the document.
    pub fn title(&self) -> Option<String> {
        let selector = CssSelector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
    }

    /// Sorts elements into document order and removes duplicates.
    pub(crate) fn sort_unique<'a>(&self, mut elements: Vec<Element<'a>>) -> Vec<Element<'a>> {
        elements.sort_by_key(|el| self.position(el));
        elements.dedup_by_key(|el| el.id());
        elements
    }

    fn position(&self, element: &Element<'_>) -> usize {
        self.order.get(&element.id()).copied().unwrap_or(usize::MAX)
    }
}

/// A wrapper around scraper's ElementRef exposing the accessors the
/// inference engine needs.
#[derive(Clone, Copy, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> From<ElementRef<'a>> for Element<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        Self { element }
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Element<'_> {}

impl<'a> Element<'a> {
    /// Tree identity of this element.
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    /// Gets the tag name of this element (lowercase for HTML documents).
    pub fn tag_name(&self) -> &'a str {
        self.element.value().name()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Whether the attribute is present, even with an empty value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Text before the first child node.
    pub fn own_text(&self) -> String {
        let mut text = String::new();
        for child in self.element.children() {
            match child.value().as_text() {
                Some(t) => text.push_str(t),
                None => break,
            }
        }
        text
    }

    /// Text following this element up to its next sibling node.
    pub fn tail_text(&self) -> String {
        let mut text = String::new();
        for sibling in self.element.next_siblings() {
            match sibling.value().as_text() {
                Some(t) => text.push_str(t),
                None => break,
            }
        }
        text
    }

    /// Every descendant text fragment, trimmed and joined by single spaces.
    pub fn text(&self) -> String {
        self.element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Gets the parent element, if any.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element.parent().and_then(ElementRef::wrap).map(Element::from)
    }

    /// Direct element children in document order.
    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + use<'a> {
        self.element.children().filter_map(ElementRef::wrap).map(Element::from)
    }

    /// All element descendants in document order, excluding this element.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a>> + use<'a> {
        self.element.descendants().skip(1).filter_map(ElementRef::wrap).map(Element::from)
    }

    /// All element ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = Element<'a>> + use<'a> {
        self.element.ancestors().filter_map(ElementRef::wrap).map(Element::from)
    }

    /// Whether this element contains `other` somewhere below it.
    pub fn is_ancestor_of(&self, other: &Element<'_>) -> bool {
        other.ancestors().any(|ancestor| ancestor.id() == self.id())
    }

    /// Whether the element has at least one element child.
    pub fn has_element_children(&self) -> bool {
        self.children().next().is_some()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }
}
