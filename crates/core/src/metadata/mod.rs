//! Post metadata pattern search.
//!
//! Once the post boundary is known, three finders look for the selectors of
//! each post's permalink ([`link`]), timestamp ([`date`]) and author
//! ([`user`]). They share the same shape: collect candidate selectors from
//! the elements below the current scope, filter and rank them, and widen the
//! scope one ancestor step when nothing survives.

pub mod date;
pub mod link;
pub mod user;

use std::collections::HashMap;

use url::Url;

use crate::config::HarvestConfig;
use crate::dates::DateRecognizer;
use crate::parse::{Document, Element};
use crate::selector::Path;

pub use date::find_date_pattern;
pub use link::find_link_pattern;
pub use user::{find_user_pattern, user_identifier};

/// Everything a finder needs to know about the page being searched.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub doc: &'a Document,
    pub base_url: &'a Url,
    /// Number of posts the locator found
    pub post_count: usize,
    pub config: &'a HarvestConfig,
    pub dates: &'a DateRecognizer,
}

/// Candidates keyed by selector, kept in insertion order.
///
/// Reading a missing selector yields `None`; entries are only created through
/// [`CandidateSet::entry`].
#[derive(Debug, Clone)]
pub struct CandidateSet<C> {
    index: HashMap<Path, usize>,
    entries: Vec<(Path, C)>,
}

impl<C> Default for CandidateSet<C> {
    fn default() -> Self {
        Self { index: HashMap::new(), entries: Vec::new() }
    }
}

impl<C> CandidateSet<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&C> {
        self.index.get(path).map(|&i| &self.entries[i].1)
    }

    /// The candidate for `path`, created with `init` if absent.
    pub fn entry(&mut self, path: Path, init: impl FnOnce() -> C) -> &mut C {
        let i = match self.index.get(&path) {
            Some(&i) => i,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, init()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// Inserts or replaces the candidate for `path`, keeping its position.
    pub fn insert(&mut self, path: Path, candidate: C) {
        match self.index.get(&path) {
            Some(&i) => self.entries[i].1 = candidate,
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, candidate));
            }
        }
    }

    /// Keeps only the candidates for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Path, &C) -> bool) {
        self.entries.retain(|(path, candidate)| keep(path, candidate));
        self.index = self.entries.iter().enumerate().map(|(i, (path, _))| (path.clone(), i)).collect();
    }

    pub fn paths(&self) -> Vec<Path> {
        self.entries.iter().map(|(path, _)| path.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &C)> {
        self.entries.iter().map(|(path, candidate)| (path, candidate))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&Path, &mut C)> {
        self.entries.iter_mut().map(|(path, candidate)| (&*path, candidate))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<(Path, C)> {
        self.entries
    }
}

/// Runs `search` on the elements matched by `post_pattern`, widening the
/// scope one ancestor step at a time until it finds something or the scope
/// shrinks to a single element.
pub fn search_upward<'a, T>(
    doc: &'a Document, post_pattern: &Path, mut search: impl FnMut(&[Element<'a>]) -> Option<T>,
) -> Option<T> {
    let mut scope = post_pattern.clone();
    loop {
        let elements = scope.evaluate(doc);
        if let Some(found) = search(&elements) {
            return Some(found);
        }
        if elements.len() <= 1 {
            return None;
        }
        tracing::debug!(scope = %scope, "Nothing found; widening search scope");
        scope = scope.widen_one_ancestor();
    }
}

/// Every element below the scope, in document order and without duplicates.
pub(crate) fn scope_descendants<'a>(doc: &'a Document, scope: &[Element<'a>]) -> Vec<Element<'a>> {
    doc.sort_unique(scope.iter().flat_map(|el| el.descendants()).collect())
}
