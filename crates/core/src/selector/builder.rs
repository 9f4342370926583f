//! Builds selectors from tree nodes and rewrites them.
//!
//! Paths are always anchored at the nearest element carrying a `class`
//! attribute; the class value is kept verbatim as an equality predicate.
//! Elements without any class-bearing ancestor get a full path from `<html>`.

use super::{ChildFilter, ClassPredicate, Path, Step};
use crate::parse::Element;

/// How far [`post_candidate`] climbs looking for a class: self, parent, grandparent.
const POST_CLASS_SEARCH_DEPTH: usize = 3;

fn step_for(element: &Element<'_>) -> Step {
    match element.attr("class") {
        Some(class) => Step::with_class(element.tag_name(), ClassPredicate::Equals(class.to_string())),
        None => Step::new(element.tag_name()),
    }
}

fn bare_root_path(element: &Element<'_>) -> Path {
    let mut steps: Vec<Step> = std::iter::once(*element)
        .chain(element.ancestors())
        .map(|el| Step::new(el.tag_name()))
        .collect();
    steps.reverse();
    Path::new(steps)
}

/// Climbs from `element` through at most `limit` ancestor-or-self levels to
/// the first class-bearing element and returns the path from there.
fn class_anchored_path(element: &Element<'_>, limit: Option<usize>) -> Option<Path> {
    let mut steps = Vec::new();
    let chain = std::iter::once(*element).chain(element.ancestors());

    for (depth, current) in chain.enumerate() {
        if limit.is_some_and(|limit| depth >= limit) {
            return None;
        }
        let step = step_for(&current);
        let anchored = step.class.is_some();
        steps.push(step);
        if anchored {
            steps.reverse();
            return Some(Path::new(steps));
        }
    }

    None
}

/// Selector candidate for a node that anchors a reference text fragment.
///
/// The class anchor is searched up to the grandparent. A trailing bare `p`
/// step is dropped so posts with and without paragraph wrappers share one
/// pattern.
pub fn post_candidate(element: &Element<'_>) -> Path {
    let mut path = class_anchored_path(element, Some(POST_CLASS_SEARCH_DEPTH)).unwrap_or_else(|| bare_root_path(element));
    strip_trailing_paragraph(&mut path);
    path
}

fn strip_trailing_paragraph(path: &mut Path) {
    if path.steps.len() > 1
        && path.filter.is_none()
        && path.steps.last().is_some_and(|step| step.tag == "p" && step.class.is_none())
    {
        path.steps.pop();
    }
}

/// Path from the nearest class-bearing ancestor-or-self down to `element`.
pub fn element_path(element: &Element<'_>) -> Path {
    class_anchored_path(element, None).unwrap_or_else(|| bare_root_path(element))
}

/// Shape filter describing the element's children.
///
/// Exactly one child element gives `[tag]`; a leaf gives the text or empty
/// leaf filter; anything else gives no filter.
pub fn child_filter(element: &Element<'_>) -> Option<ChildFilter> {
    let mut children = element.children();
    match (children.next(), children.next()) {
        (Some(only), None) => Some(ChildFilter::Child(only.tag_name().to_string())),
        (None, _) if element.own_text().trim().is_empty() => Some(ChildFilter::EmptyLeaf),
        (None, _) => Some(ChildFilter::TextLeaf),
        _ => None,
    }
}

/// Selector used by the metadata finders: [`element_path`] plus [`child_filter`].
pub fn metadata_path(element: &Element<'_>) -> Path {
    element_path(element).with_filter(child_filter(element))
}

/// Merges paths that differ only in the class value of their first step.
///
/// For every group of such paths with at least two distinct class values one
/// merged path is returned. Tokens shared by all variants become a single
/// contains-group; without shared tokens, each variant's tokens form one
/// alternative.
pub fn merge_class_variants(paths: &[Path]) -> Vec<Path> {
    let mut groups: Vec<(Path, Vec<&str>)> = Vec::new();

    for path in paths {
        let Some(ClassPredicate::Equals(class)) = path.steps.first().and_then(|s| s.class.as_ref()) else {
            continue;
        };
        let mut skeleton = path.clone();
        skeleton.steps[0].class = None;

        match groups.iter_mut().find(|(key, _)| *key == skeleton) {
            Some((_, classes)) => {
                if !classes.contains(&class.as_str()) {
                    classes.push(class);
                }
            }
            None => groups.push((skeleton, vec![class])),
        }
    }

    groups
        .into_iter()
        .filter(|(_, classes)| classes.len() > 1)
        .map(|(mut skeleton, classes)| {
            let token_sets: Vec<Vec<String>> = classes
                .iter()
                .map(|class| dedup_words(class.split_whitespace()))
                .collect();
            let common: Vec<String> = token_sets[0]
                .iter()
                .filter(|token| token_sets[1..].iter().all(|set| set.contains(token)))
                .cloned()
                .collect();

            let predicate = if common.is_empty() {
                ClassPredicate::AnyOf(token_sets)
            } else {
                ClassPredicate::AnyOf(vec![common])
            };
            skeleton.steps[0].class = Some(predicate);
            skeleton
        })
        .collect()
}

/// Alternatives for a path whose last class predicate is a multi-word equality:
/// one single-word contains predicate per word, then all words combined.
pub fn class_combinations(path: &Path) -> Vec<Path> {
    let Some(ClassPredicate::Equals(class)) = path.last_class() else {
        return Vec::new();
    };
    let words = dedup_words(class.split_whitespace());
    if words.len() < 2 {
        return Vec::new();
    }

    words
        .iter()
        .map(|word| ClassPredicate::ContainsAll(vec![word.clone()]))
        .chain(std::iter::once(ClassPredicate::ContainsAll(words.clone())))
        .map(|predicate| path.with_last_class(predicate))
        .collect()
}

fn dedup_words<'a>(words: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for word in words {
        if !unique.iter().any(|w| w == word) {
            unique.push(word.to_string());
        }
    }
    unique
}
