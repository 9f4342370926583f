//! Permalink selector search.

use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{CandidateSet, SearchContext, scope_descendants, search_upward};
use crate::parse::Element;
use crate::selector::Path;
use crate::selector::builder::{merge_class_variants, metadata_path};

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid number regex"));

#[derive(Debug, Clone, Default)]
pub struct LinkCandidate<'a> {
    pub elements: Vec<Element<'a>>,
    /// Some matched anchor carries a `name` attribute
    pub has_anchor_tag: bool,
    /// The post numbers found in the links strictly increase
    pub counts_up: bool,
}

/// Finds the selector of each post's permalink.
///
/// Returns `None` when no anchor pattern below the posts (or any of their
/// ancestors) repeats about once per post and stays on the forum page.
pub fn find_link_pattern(ctx: &SearchContext<'_>, post_pattern: &Path) -> Option<Path> {
    let found = search_upward(ctx.doc, post_pattern, |scope| best_link(ctx, scope));
    match &found {
        Some(path) => tracing::info!(selector = %path, "Found post link pattern"),
        None => tracing::debug!("No post link pattern"),
    }
    found
}

fn best_link<'a>(ctx: &SearchContext<'a>, scope: &[Element<'a>]) -> Option<Path> {
    let mut candidates: CandidateSet<LinkCandidate<'a>> = CandidateSet::new();

    for el in scope_descendants(ctx.doc, scope) {
        if el.tag_name() != "a" {
            continue;
        }
        let named = el.has_attr("name");
        if !named && !el.has_attr("href") {
            continue;
        }
        let candidate = candidates.entry(metadata_path(&el), LinkCandidate::default);
        candidate.elements.push(el);
        candidate.has_anchor_tag |= named;
    }

    for merged in merge_class_variants(&candidates.paths()) {
        let elements = merged.evaluate(ctx.doc);
        if let Some(first) = elements.first() {
            let has_anchor_tag = first.has_attr("name");
            candidates.insert(merged, LinkCandidate { elements, has_anchor_tag, counts_up: false });
        }
    }

    let slack = ctx.config.link_count_slack;
    candidates.retain(|_, c| c.elements.len().abs_diff(ctx.post_count) <= slack);

    // Site root rather than `Url::origin`, which is opaque for `file:` pages.
    let Ok(root) = ctx.base_url.join("/") else {
        return None;
    };
    candidates.retain(|path, c| {
        let on_page = c.elements.iter().all(|el| points_into_page(&root, ctx.base_url, el));
        if !on_page {
            tracing::debug!(selector = %path, "Dropping link candidate leaving the forum page");
        }
        on_page
    });

    for (_, candidate) in candidates.iter_mut() {
        candidate.counts_up = counts_up(&candidate.elements);
    }

    // Remaining ties prefer the match count closest to the post count.
    let mut ranked = candidates.into_vec();
    ranked.sort_by_key(|(_, c)| {
        (Reverse((c.has_anchor_tag, c.counts_up)), c.elements.len().abs_diff(ctx.post_count))
    });
    ranked.into_iter().next().map(|(path, _)| path)
}

/// Whether the anchor's target stays on the forum host and below the page path.
fn points_into_page(root: &Url, base: &Url, el: &Element<'_>) -> bool {
    let href = el.attr("href").unwrap_or_default();
    let Ok(target) = root.join(href) else {
        return false;
    };
    if target.host_str() != base.host_str() {
        return false;
    }
    base.path().contains(without_post_segment(target.path()))
}

/// Drops the last segment of deep paths, so `/threads/topic.12/post-345` is
/// compared as `/threads/topic.12`.
fn without_post_segment(path: &str) -> &str {
    let segments = path.split('/').filter(|s| !s.trim().is_empty()).count();
    if segments > 2 {
        path.rsplit_once('/').map_or(path, |(head, _)| head)
    } else {
        path
    }
}

/// The first number of each link's text (or its target when the text is
/// empty) strictly increases across the matches.
fn counts_up(elements: &[Element<'_>]) -> bool {
    let numbers: Option<Vec<u64>> = elements
        .iter()
        .map(|el| {
            let text = el.text();
            let representation = if text.is_empty() { el.attr("href").unwrap_or_default().to_string() } else { text };
            FIRST_NUMBER.find(&representation)?.as_str().parse().ok()
        })
        .collect();

    numbers.is_some_and(|numbers| numbers.windows(2).all(|pair| pair[0] < pair[1]))
}
