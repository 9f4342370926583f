//! Post timestamp selector search.

use std::cmp::Reverse;

use chrono::NaiveDateTime;

use super::{CandidateSet, SearchContext, scope_descendants, search_upward};
use crate::dates::{DateRecognizer, parse_datetime_attr};
use crate::parse::Element;
use crate::selector::Path;
use crate::selector::builder::metadata_path;

#[derive(Debug, Clone, Default)]
pub struct DateCandidate<'a> {
    pub elements: Vec<Element<'a>>,
    /// One date per element, filled in during ranking
    pub dates: Vec<NaiveDateTime>,
}

impl DateCandidate<'_> {
    /// Exactly one match per post
    pub fn same_size(&self, post_count: usize) -> bool {
        self.elements.len() == post_count
    }

    /// The dates never go back and forth: they are sorted in either direction.
    pub fn chronological(&self) -> bool {
        let ascending = self.dates.windows(2).all(|pair| pair[0] <= pair[1]);
        let descending = self.dates.windows(2).all(|pair| pair[0] >= pair[1]);
        ascending || descending
    }

    pub fn most_recent(&self) -> Option<NaiveDateTime> {
        self.dates.iter().max().copied()
    }
}

/// Own text plus tail text with list separators turned into spaces.
pub fn cleaned_text(element: &Element<'_>) -> String {
    format!("{}{}", element.own_text(), element.tail_text())
        .replace([',', ';'], " ")
        .trim()
        .to_string()
}

/// The date an element carries: the `datetime` attribute of `<time>`, or
/// else the most recent non-future date in its cleaned text.
pub fn element_date(element: &Element<'_>, dates: &DateRecognizer) -> Option<NaiveDateTime> {
    if element.tag_name() == "time"
        && let Some(date) = element.attr("datetime").and_then(parse_datetime_attr)
    {
        return Some(date);
    }
    dates.most_recent(&cleaned_text(element)).map(|found| found.date)
}

fn mentions_date(ctx: &SearchContext<'_>, element: &Element<'_>) -> bool {
    if element.tag_name() == "time" && element.attr("datetime").and_then(parse_datetime_attr).is_some() {
        return true;
    }
    let text = cleaned_text(element);
    text.chars().count() <= ctx.config.max_date_text_len && ctx.dates.contains_date(&text)
}

/// Finds the selector of each post's timestamp.
///
/// Candidates must match at least one element per post, at most
/// `date_count_slack` more, and yield a date for every match. Complete, chronologically sorted
/// candidates with the most recent dates rank first.
pub fn find_date_pattern(ctx: &SearchContext<'_>, post_pattern: &Path) -> Option<Path> {
    let found = search_upward(ctx.doc, post_pattern, |scope| best_date(ctx, scope));
    match &found {
        Some(path) => tracing::info!(selector = %path, "Found post date pattern"),
        None => tracing::debug!("No post date pattern"),
    }
    found
}

fn best_date<'a>(ctx: &SearchContext<'a>, scope: &[Element<'a>]) -> Option<Path> {
    let mut candidates: CandidateSet<DateCandidate<'a>> = CandidateSet::new();

    for el in scope_descendants(ctx.doc, scope) {
        if mentions_date(ctx, &el) {
            candidates.entry(metadata_path(&el), DateCandidate::default).elements.push(el);
        }
    }

    let (min, max) = (ctx.post_count, ctx.post_count + ctx.config.date_count_slack);
    candidates.retain(|_, c| (min..=max).contains(&c.elements.len()));

    let mut ranked: Vec<(Path, DateCandidate<'a>)> = candidates
        .into_vec()
        .into_iter()
        .filter_map(|(path, mut candidate)| {
            let dates: Option<Vec<NaiveDateTime>> =
                candidate.elements.iter().map(|el| element_date(el, ctx.dates)).collect();
            let Some(dates) = dates else {
                tracing::debug!(selector = %path, "Dropping date candidate without a date for every match");
                return None;
            };
            candidate.dates = dates;
            Some((path, candidate))
        })
        .collect();

    ranked.sort_by_key(|(_, c)| Reverse((c.same_size(ctx.post_count), c.chronological(), c.most_recent())));
    ranked.into_iter().next().map(|(path, _)| path)
}
