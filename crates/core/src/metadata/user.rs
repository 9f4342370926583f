//! Post author selector search.
//!
//! Authors show up either as links to a profile page or as short text
//! labels. Both kinds are collected; forum boilerplate ("Reply", "Report")
//! and static labels are filtered out, and forums that render guests and
//! registered users differently get a union of two selectors.

use std::cmp::Reverse;

use regex::Regex;
use url::Url;

use super::{CandidateSet, SearchContext, scope_descendants, search_upward};
use crate::parse::Element;
use crate::selector::builder::metadata_path;
use crate::selector::{Path, Selector};

const TEXT_TAGS: &[&str] = &["span", "strong", "div", "b"];
const MIN_NAME_CHARS: usize = 3;
const MAX_NAME_CHARS: usize = 100;
const MAX_NAME_WORDS: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct UserCandidate<'a> {
    pub elements: Vec<Element<'a>>,
    /// Matches are profile links rather than text labels
    pub is_link: bool,
    pub score: u8,
}

/// Renders a stable identifier for a user name on a forum host.
///
/// ```rust
/// use harvest_core::metadata::user_identifier;
/// use url::Url;
///
/// let base = Url::parse("http://www.heise.de/security").unwrap();
/// assert_eq!(user_identifier("Therese Kurz", &base), "Therese.Kurz@www.heise.de");
/// ```
pub fn user_identifier(name: &str, base_url: &Url) -> String {
    let name = name.split_whitespace().collect::<Vec<_>>().join(".");
    format!("{}@{}", name, base_url.host_str().unwrap_or_default())
}

/// Finds the selector of each post's author.
///
/// The result is a union of two selectors when no single pattern covers
/// every post but two disjoint ones together do.
pub fn find_user_pattern(ctx: &SearchContext<'_>, post_pattern: &Path) -> Option<Selector> {
    let forbidden = forbidden_terms(&ctx.config.forbidden_user_terms);
    let found = search_upward(ctx.doc, post_pattern, |scope| best_user(ctx, scope, forbidden.as_ref()));
    match &found {
        Some(selector) => tracing::info!(selector = %selector, "Found post user pattern"),
        None => tracing::debug!("No post user pattern"),
    }
    found
}

fn forbidden_terms(terms: &[String]) -> Option<Regex> {
    if terms.is_empty() {
        return None;
    }
    let alternatives = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    match Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unusable forbidden user terms");
            None
        }
    }
}

/// Short leaf text that could be a person's name.
fn looks_like_name(element: &Element<'_>) -> bool {
    if !TEXT_TAGS.contains(&element.tag_name()) || element.has_element_children() {
        return false;
    }
    let text = element.text();
    let chars = text.chars().count();
    let lower = text.to_lowercase();

    (MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&chars)
        && text.split_whitespace().count() <= MAX_NAME_WORDS
        && !lower.contains("http")
        && !lower.contains("www.")
}

fn best_user<'a>(ctx: &SearchContext<'a>, scope: &[Element<'a>], forbidden: Option<&Regex>) -> Option<Selector> {
    let mut candidates: CandidateSet<UserCandidate<'a>> = CandidateSet::new();

    for el in scope_descendants(ctx.doc, scope) {
        let is_link = el.tag_name() == "a" && el.has_attr("href");
        if is_link || looks_like_name(&el) {
            let candidate = candidates.entry(metadata_path(&el), || UserCandidate { is_link, ..Default::default() });
            candidate.elements.push(el);
        }
    }

    candidates.retain(|path, c| {
        let keep = !mostly_forbidden(c, forbidden)
            && if c.is_link { links_to_profiles(ctx, c) } else { varies_like_names(ctx, c) };
        if !keep {
            tracing::debug!(selector = %path, "Dropping user candidate");
        }
        keep
    });

    for (path, candidate) in candidates.iter_mut() {
        candidate.score = score(ctx, path, candidate);
    }

    let mut ranked: Vec<(Selector, UserCandidate<'a>)> = candidates
        .iter()
        .filter(|(_, c)| c.elements.len() == ctx.post_count)
        .map(|(path, c)| (Selector::from(path.clone()), c.clone()))
        .collect();
    if ranked.is_empty() {
        ranked = split_patterns(ctx, &candidates);
    }

    ranked.sort_by_key(|(_, c)| Reverse((c.is_link, c.score, c.elements.len())));
    ranked.into_iter().next().map(|(selector, _)| selector)
}

fn mostly_forbidden(candidate: &UserCandidate<'_>, forbidden: Option<&Regex>) -> bool {
    let Some(forbidden) = forbidden else {
        return false;
    };
    let hits = candidate.elements.iter().filter(|el| forbidden.is_match(&el.text())).count();
    hits * 2 > candidate.elements.len()
}

/// Profile links stay on the forum host and never point back at the page itself.
fn links_to_profiles(ctx: &SearchContext<'_>, candidate: &UserCandidate<'_>) -> bool {
    candidate.elements.iter().all(|el| {
        let Ok(target) = ctx.base_url.join(el.attr("href").unwrap_or_default()) else {
            return false;
        };
        let same_page = target.path() == ctx.base_url.path() && target.query() == ctx.base_url.query();
        target.host_str() == ctx.base_url.host_str() && !same_page
    })
}

/// Text labels must change from post to post unless they are dates, and
/// must not all be dates.
fn varies_like_names(ctx: &SearchContext<'_>, candidate: &UserCandidate<'_>) -> bool {
    let texts: Vec<String> = candidate.elements.iter().map(Element::text).collect();
    let dated = texts.iter().filter(|t| ctx.dates.contains_date(t)).count();

    if dated == texts.len() {
        return false;
    }
    let invariant = texts.len() > 1 && texts.iter().all(|t| *t == texts[0]);
    !(invariant && dated == 0)
}

fn score(ctx: &SearchContext<'_>, path: &Path, candidate: &UserCandidate<'_>) -> u8 {
    let hinted = |value: &str| {
        let value = value.to_lowercase();
        ctx.config.user_hints.iter().any(|hint| value.contains(hint.as_str()))
    };

    let has_hint = hinted(&path.to_string())
        || (candidate.is_link && candidate.elements.iter().filter_map(|el| el.attr("href")).any(hinted));
    let first = candidate.elements.first().map(Element::text);
    let distinct = candidate.elements.iter().any(|el| Some(el.text()) != first);

    u8::from(has_hint) + u8::from(distinct) + u8::from(candidate.is_link)
}

/// Pairs of disjoint under-sized candidates that together cover every post.
fn split_patterns<'a>(
    ctx: &SearchContext<'a>, candidates: &CandidateSet<UserCandidate<'a>>,
) -> Vec<(Selector, UserCandidate<'a>)> {
    let partial: Vec<(&Path, &UserCandidate<'a>)> =
        candidates.iter().filter(|(_, c)| c.elements.len() < ctx.post_count).collect();

    let mut combined = Vec::new();
    for (i, (path_a, a)) in partial.iter().enumerate() {
        for (path_b, b) in &partial[i + 1..] {
            if a.elements.len() + b.elements.len() != ctx.post_count {
                continue;
            }
            if a.elements.iter().any(|el| b.elements.contains(el)) {
                continue;
            }
            let elements = ctx.doc.sort_unique(a.elements.iter().chain(&b.elements).copied().collect());
            let candidate = UserCandidate { elements, is_link: a.is_link && b.is_link, score: a.score.min(b.score) };
            combined.push((Selector::Union(vec![(*path_a).clone(), (*path_b).clone()]), candidate));
        }
    }
    combined
}
