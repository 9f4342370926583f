//! Structural selectors.
//!
//! A [`Selector`] is the typed form of the small XPath subset the engine
//! produces: a descendant-rooted tag path with optional `class` predicates, an
//! optional child-shape filter on the last step, and trailing ancestor steps.
//!
//! The string dialect only exists at the boundary. [`Display`](std::fmt::Display)
//! renders it, [`FromStr`](std::str::FromStr) reads it back (see [`parser`]),
//! and serde moves selectors around as strings.
//!
//! ```rust
//! use harvest_core::selector::Selector;
//!
//! let selector: Selector = r#"//div[@class="message-body"]/.."#.parse().unwrap();
//! assert_eq!(selector.to_string(), r#"//div[@class="message-body"]/.."#);
//! ```

pub mod builder;
pub mod parser;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::parse::{Document, Element};

/// Predicate over the `class` attribute of one step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassPredicate {
    /// `[@class="v"]`, compared against the raw attribute value.
    Equals(String),
    /// `[contains(@class, 'a') and contains(@class, 'b')]`
    ContainsAll(Vec<String>),
    /// `[(contains(@class, 'a') and ...) or (contains(@class, 'c'))]`
    AnyOf(Vec<Vec<String>>),
}

impl ClassPredicate {
    /// Whether an element with the given `class` attribute satisfies the predicate.
    ///
    /// A missing attribute never matches.
    pub fn matches(&self, class: Option<&str>) -> bool {
        let Some(class) = class else {
            return false;
        };

        match self {
            ClassPredicate::Equals(value) => class == value,
            ClassPredicate::ContainsAll(words) => contains_all(class, words),
            ClassPredicate::AnyOf(groups) => groups.iter().any(|words| contains_all(class, words)),
        }
    }

    /// Every class word mentioned by the predicate, in order.
    pub fn words(&self) -> Vec<&str> {
        match self {
            ClassPredicate::Equals(value) => value.split_whitespace().collect(),
            ClassPredicate::ContainsAll(words) => words.iter().map(String::as_str).collect(),
            ClassPredicate::AnyOf(groups) => groups.iter().flatten().map(String::as_str).collect(),
        }
    }
}

fn contains_all(class: &str, words: &[String]) -> bool {
    words.iter().all(|word| class.contains(word.as_str()))
}

impl fmt::Display for ClassPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassPredicate::Equals(value) => write!(f, "[@class={}]", Literal { value, quote: '"' }),
            ClassPredicate::ContainsAll(words) => write!(f, "[{}]", ContainsList(words)),
            ClassPredicate::AnyOf(groups) => {
                f.write_str("[")?;
                for (i, words) in groups.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "({})", ContainsList(words))?;
                }
                f.write_str("]")
            }
        }
    }
}

struct ContainsList<'a>(&'a [String]);

impl fmt::Display for ContainsList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "contains(@class, {})", Literal { value: word, quote: '\'' })?;
        }
        Ok(())
    }
}

/// XPath string literal. Falls back to the other quote character, or to
/// `concat()` when the value holds both.
struct Literal<'a> {
    value: &'a str,
    quote: char,
}

impl fmt::Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let other = if self.quote == '"' { '\'' } else { '"' };
        if !self.value.contains(self.quote) {
            return write!(f, "{q}{}{q}", self.value, q = self.quote);
        }
        if !self.value.contains(other) {
            return write!(f, "{q}{}{q}", self.value, q = other);
        }

        f.write_str("concat(")?;
        for (i, segment) in self.value.split(self.quote).enumerate() {
            if i > 0 {
                write!(f, ", {o}{q}{o}, ", o = other, q = self.quote)?;
            }
            write!(f, "{q}{}{q}", segment, q = self.quote)?;
        }
        f.write_str(")")
    }
}

/// Shape filter applied to the last step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChildFilter {
    /// `[tag]`: the element has a child element named `tag`.
    Child(String),
    /// `[not(*) and string-length(text()) > 0]`
    TextLeaf,
    /// `[not(*) and string-length(text()) = 0]`
    EmptyLeaf,
}

impl ChildFilter {
    pub fn matches(&self, element: &Element<'_>) -> bool {
        match self {
            ChildFilter::Child(tag) => element.children().any(|child| child.tag_name() == tag),
            ChildFilter::TextLeaf => !element.has_element_children() && !element.own_text().trim().is_empty(),
            ChildFilter::EmptyLeaf => !element.has_element_children() && element.own_text().trim().is_empty(),
        }
    }
}

impl fmt::Display for ChildFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildFilter::Child(tag) => write!(f, "[{}]", tag),
            ChildFilter::TextLeaf => f.write_str("[not(*) and string-length(text()) > 0]"),
            ChildFilter::EmptyLeaf => f.write_str("[not(*) and string-length(text()) = 0]"),
        }
    }
}

/// One location step: a tag name and an optional class predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub tag: String,
    pub class: Option<ClassPredicate>,
}

impl Step {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), class: None }
    }

    pub fn with_class(tag: impl Into<String>, class: ClassPredicate) -> Self {
        Self { tag: tag.into(), class: Some(class) }
    }

    pub fn matches(&self, element: &Element<'_>) -> bool {
        element.tag_name() == self.tag
            && self
                .class
                .as_ref()
                .is_none_or(|predicate| predicate.matches(element.attr("class")))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        if let Some(class) = &self.class {
            write!(f, "{}", class)?;
        }
        Ok(())
    }
}

/// A single descendant-rooted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pub steps: Vec<Step>,
    pub filter: Option<ChildFilter>,
    pub parent_steps: usize,
}

impl Path {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps, filter: None, parent_steps: 0 }
    }

    pub fn with_filter(mut self, filter: Option<ChildFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// The same path moved one step towards the document root (`/..`).
    pub fn widen_one_ancestor(&self) -> Path {
        let mut widened = self.clone();
        widened.parent_steps += 1;
        widened
    }

    /// The path with every trailing `/..` removed.
    pub fn without_ancestor_steps(&self) -> Path {
        let mut narrowed = self.clone();
        narrowed.parent_steps = 0;
        narrowed
    }

    /// Index of the last step that carries a class predicate.
    pub fn last_class_step(&self) -> Option<usize> {
        self.steps.iter().rposition(|step| step.class.is_some())
    }

    /// The class predicate of the last class-bearing step.
    pub fn last_class(&self) -> Option<&ClassPredicate> {
        self.last_class_step().and_then(|i| self.steps[i].class.as_ref())
    }

    /// Replaces the predicate of the last class-bearing step.
    ///
    /// Paths without any class predicate are returned unchanged.
    pub fn with_last_class(&self, class: ClassPredicate) -> Path {
        let mut rewritten = self.clone();
        if let Some(i) = self.last_class_step() {
            rewritten.steps[i].class = Some(class);
        }
        rewritten
    }

    /// Whether any step is named after one of `tags`.
    pub fn names_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        self.steps.iter().any(|step| tags.iter().any(|tag| tag.as_ref() == step.tag))
    }

    pub fn evaluate<'a>(&self, doc: &'a Document) -> Vec<Element<'a>> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Vec::new();
        };

        let mut matches: Vec<Element<'a>> = doc.elements().filter(|el| first.matches(el)).collect();
        for step in rest {
            matches = matches
                .iter()
                .flat_map(|el| el.children().filter(move |child| step.matches(child)))
                .collect();
        }
        if !rest.is_empty() {
            matches = doc.sort_unique(matches);
        }

        if let Some(filter) = &self.filter {
            matches.retain(|el| filter.matches(el));
        }

        for _ in 0..self.parent_steps {
            matches = doc.sort_unique(matches.iter().filter_map(Element::parent).collect());
        }

        matches
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("//")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", step)?;
        }
        if let Some(filter) = &self.filter {
            write!(f, "{}", filter)?;
        }
        for _ in 0..self.parent_steps {
            f.write_str("/..")?;
        }
        Ok(())
    }
}

/// A structural selector: one path or the union of several.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Path(Path),
    Union(Vec<Path>),
}

impl Selector {
    /// Evaluates the selector. The match set is in document order without duplicates.
    pub fn evaluate<'a>(&self, doc: &'a Document) -> Vec<Element<'a>> {
        match self {
            Selector::Path(path) => path.evaluate(doc),
            Selector::Union(paths) => doc.sort_unique(paths.iter().flat_map(|p| p.evaluate(doc)).collect()),
        }
    }

    /// The selector moved one ancestor step up. Unions widen every branch.
    pub fn widen_one_ancestor(&self) -> Selector {
        match self {
            Selector::Path(path) => Selector::Path(path.widen_one_ancestor()),
            Selector::Union(paths) => Selector::Union(paths.iter().map(Path::widen_one_ancestor).collect()),
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Selector::Path(path) => Some(path),
            Selector::Union(_) => None,
        }
    }

    pub fn paths(&self) -> &[Path] {
        match self {
            Selector::Path(path) => std::slice::from_ref(path),
            Selector::Union(paths) => paths,
        }
    }
}

impl From<Path> for Selector {
    fn from(path: Path) -> Self {
        Selector::Path(path)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Path(path) => write!(f, "{}", path),
            Selector::Union(paths) => {
                for (i, path) in paths.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", path)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
