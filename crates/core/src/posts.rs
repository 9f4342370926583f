//! Post boundary inference.
//!
//! The locator maps every reference text fragment back onto the element that
//! carries it, turns those elements into candidate selectors, keeps the one
//! whose matches best reproduce the reference content and then widens it
//! towards the document root for as long as it still repeats often enough to
//! denote a list of posts.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::config::HarvestConfig;
//! use harvest_core::oracle::{ContentOracle, PageTextOracle};
//! use harvest_core::parse::Document;
//! use harvest_core::posts::{PostLocator, reference_fragments};
//!
//! let html = r#"<html><body>
//!     <div class="post"><div class="text">First answer about the garden hose</div></div>
//!     <div class="post"><div class="text">Second answer about the rain barrel</div></div>
//!     <div class="post"><div class="text">Third answer about the compost heap</div></div>
//! </body></html>"#;
//!
//! let config = HarvestConfig::default();
//! let lines = PageTextOracle::new().extract_main_text(html);
//! let fragments = reference_fragments(&lines, &config.footer_markers);
//! let doc = Document::parse(html).unwrap();
//!
//! let located = PostLocator::new(&doc, &config).locate(&fragments).unwrap();
//! assert_eq!(located.pattern.to_string(), r#"//div[@class="text"]/.."#);
//! assert_eq!(located.posts.len(), 3);
//! ```

use tracing::{debug, info, warn};

use crate::cleanup::{collapse_whitespace, trim_boilerplate};
use crate::config::HarvestConfig;
use crate::parse::{Document, Element};
use crate::scoring::{Assessment, assess};
use crate::selector::Path;
use crate::selector::builder::{class_combinations, post_candidate};
use crate::similarity::SimilarityScorer;

/// Outcome of a successful post boundary search.
#[derive(Debug, Clone)]
pub struct PostPattern {
    /// Selector matching one element per post
    pub pattern: Path,
    /// Score and match count of `pattern`
    pub assessment: Assessment,
    /// Narrowest selector yielding exactly one element per post
    pub text_pattern: Path,
    /// Boilerplate-trimmed text of every post
    pub posts: Vec<String>,
}

/// Cleans oracle lines into reference fragments.
///
/// Blank lines are dropped and the list ends before the first line carrying a
/// footer marker, compared case-insensitively.
pub fn reference_fragments(lines: &[String], footer_markers: &[String]) -> Vec<String> {
    let markers: Vec<String> = footer_markers.iter().map(|m| m.to_lowercase()).collect();

    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .take_while(|line| {
            let lower = line.to_lowercase();
            !markers.iter().any(|marker| lower.contains(marker.as_str()))
        })
        .map(str::to_string)
        .collect()
}

fn char_prefix(text: &str, chars: usize) -> &str {
    text.char_indices().nth(chars).map_or(text, |(i, _)| &text[..i])
}

/// Infers post selectors for a single document.
pub struct PostLocator<'a> {
    doc: &'a Document,
    config: &'a HarvestConfig,
    // Normalized own text of every element carrying some, in document order.
    texts: Vec<(Element<'a>, String)>,
}

impl<'a> PostLocator<'a> {
    pub fn new(doc: &'a Document, config: &'a HarvestConfig) -> Self {
        let texts = doc
            .elements()
            .filter_map(|el| {
                let text = collapse_whitespace(&el.own_text());
                (!text.is_empty()).then_some((el, text))
            })
            .collect();

        Self { doc, config, texts }
    }

    /// First element, in document order, whose own text starts the fragment.
    ///
    /// Only the first `match_prefix_size` characters of the element text are
    /// compared, and the element text must be at least as long as the
    /// fragment's compared prefix.
    pub fn anchor(&self, fragment: &str) -> Option<Element<'a>> {
        let size = self.config.match_prefix_size;
        let fragment_prefix_len = char_prefix(fragment, size).chars().count();

        self.texts
            .iter()
            .find(|(_, text)| fragment.starts_with(char_prefix(text, size)) && text.chars().count() >= fragment_prefix_len)
            .map(|(el, _)| *el)
    }

    /// Runs the full post boundary search over the reference fragments.
    ///
    /// Returns `None` when no fragment can be anchored or no candidate
    /// repeats on the page.
    pub fn locate(&self, fragments: &[String]) -> Option<PostPattern> {
        let reference = fragments.join(" ");
        let scorer = SimilarityScorer::new(&reference, self.config.vsm_size);

        let Some((path, assessment)) = self.best_candidate(fragments, &scorer) else {
            warn!(fragments = fragments.len(), "No post candidate found");
            return None;
        };
        debug!(selector = %path, score = assessment.score, count = assessment.element_count, "Best post candidate");

        let (mut path, mut assessment) = self.widen(path, assessment, &scorer);
        if let Some((refined, refined_assessment)) = self.refine(&path, &scorer) {
            info!(from = %path, to = %refined, "Refined post selector class");
            (path, assessment) = self.widen(refined, refined_assessment, &scorer);
        }

        let matches = path.evaluate(self.doc);
        let texts: Vec<String> = matches.iter().map(Element::text).collect();
        let posts = trim_boilerplate(&texts, self.config.min_prefix_words, self.config.min_suffix_words);
        let text_pattern = self.text_pattern(&path, matches.len());

        info!(selector = %path, score = assessment.score, posts = posts.len(), "Located post pattern");
        Some(PostPattern { pattern: path, assessment, text_pattern, posts })
    }

    fn best_candidate(&self, fragments: &[String], scorer: &SimilarityScorer) -> Option<(Path, Assessment)> {
        let mut candidates: Vec<(Path, Assessment)> = Vec::new();

        for fragment in fragments {
            let Some(anchor) = self.anchor(fragment) else {
                debug!(fragment = %char_prefix(fragment, self.config.match_prefix_size), "No element found for fragment");
                continue;
            };
            if self.config.non_body_tags.iter().any(|tag| tag == anchor.tag_name()) {
                debug!(tag = anchor.tag_name(), "Skipping fragment anchored on a non-body tag");
                continue;
            }

            let path = post_candidate(&anchor);
            if candidates.iter().any(|(known, _)| *known == path) {
                continue;
            }

            let assessment = assess(self.doc, &path, scorer, self.config, true);
            debug!(selector = %path, score = assessment.score, count = assessment.element_count, "Post candidate");
            if assessment.element_count > 1 {
                candidates.push((path, assessment));
            }
        }

        // Full ties go to the greater selector string so the choice never
        // depends on fragment order.
        candidates.into_iter().max_by(|(pa, a), (pb, b)| {
            a.score
                .total_cmp(&b.score)
                .then(a.element_count.cmp(&b.element_count))
                .then_with(|| pa.to_string().cmp(&pb.to_string()))
        })
    }

    /// Moves the selector up through its ancestors while it still matches at
    /// least `min_post_count` elements.
    fn widen(&self, mut path: Path, mut assessment: Assessment, scorer: &SimilarityScorer) -> (Path, Assessment) {
        loop {
            let wider = path.widen_one_ancestor();
            let wider_assessment = assess(self.doc, &wider, scorer, self.config, false);
            if wider_assessment.element_count < self.config.min_post_count {
                break;
            }
            // A rejected selector still reports one match; stop at the root.
            if wider_assessment == Assessment::REJECTED && wider.evaluate(self.doc).is_empty() {
                break;
            }
            path = wider;
            assessment = wider_assessment;
        }
        (path, assessment)
    }

    /// Tries looser class predicates for zebra-striped posts whose class
    /// alternates between two values.
    fn refine(&self, path: &Path, scorer: &SimilarityScorer) -> Option<(Path, Assessment)> {
        let alternatives = class_combinations(path);
        if alternatives.is_empty() {
            return None;
        }

        let current = assess(self.doc, path, scorer, self.config, true);
        let count = current.element_count;
        let mut best: Option<(Path, Assessment)> = None;

        for alternative in alternatives {
            let candidate = assess(self.doc, &alternative, scorer, self.config, true);
            let found = candidate.element_count;

            let plausible_size = (count < found && found <= count + 2) || (2 * count).abs_diff(found) <= 1;
            if !plausible_size || candidate.score <= current.score {
                continue;
            }
            if has_nested_matches(&alternative.evaluate(self.doc)) {
                debug!(selector = %alternative, "Refinement matches nested elements");
                continue;
            }
            if best.as_ref().is_none_or(|(_, b)| candidate.beats(b)) {
                best = Some((alternative, candidate));
            }
        }

        best
    }

    /// Narrowest form of `pattern` that still yields one element per post.
    fn text_pattern(&self, pattern: &Path, post_count: usize) -> Path {
        let mut candidate = pattern.without_ancestor_steps();
        loop {
            let found = candidate.evaluate(self.doc).len();
            if found == post_count {
                return candidate;
            }
            if found < post_count || found <= 1 {
                debug!(selector = %pattern, "No narrower text selector; using the post selector");
                return pattern.clone();
            }
            candidate = candidate.widen_one_ancestor();
        }
    }
}

fn has_nested_matches(elements: &[Element<'_>]) -> bool {
    elements
        .iter()
        .any(|outer| elements.iter().any(|inner| outer.is_ancestor_of(inner)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{ContentOracle, PageTextOracle};

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn locate(html: &str, config: &HarvestConfig) -> Option<PostPattern> {
        let lines = PageTextOracle::new().extract_main_text(html);
        let fragments = reference_fragments(&lines, &config.footer_markers);
        let doc = Document::parse(html).unwrap();
        PostLocator::new(&doc, config).locate(&fragments)
    }

    const GARDEN: &str = r#"
        <html><body>
            <h1>Thread about gardening</h1>
            <div id="thread">
                <div class="post">
                    <div class="author">ann</div>
                    <div class="message-body"><p>Tomatoes need a lot of sun and regular watering in summer.</p></div>
                </div>
                <div class="post">
                    <div class="author">bob</div>
                    <div class="message-body"><p>Mulch keeps the soil moist during the hottest weeks.</p></div>
                </div>
                <div class="post">
                    <div class="author">cid</div>
                    <div class="message-body"><p>Pinch off the side shoots so the plant grows upwards.</p></div>
                </div>
                <div class="post">
                    <div class="author">dan</div>
                    <div class="message-body"><p>Cherry varieties ripen much earlier than beefsteak ones.</p></div>
                </div>
            </div>
            <div class="footer">Copyright 2024 Garden forum</div>
        </body></html>
    "#;

    #[test]
    fn test_reference_fragments_stop_at_footer() {
        let lines = owned(&["  Intro ", "", "Body text", "COPYRIGHT 2020", "after footer"]);
        let fragments = reference_fragments(&lines, &["copyright".to_string()]);
        assert_eq!(fragments, owned(&["Intro", "Body text"]));
    }

    #[test]
    fn test_anchor_uses_prefix() {
        let doc = Document::parse(GARDEN).unwrap();
        let config = HarvestConfig::default();
        let locator = PostLocator::new(&doc, &config);

        let anchor = locator
            .anchor("Tomatoes need a lot of sun and regular watering in summer. Extra words")
            .unwrap();
        assert_eq!(anchor.tag_name(), "p");

        assert_eq!(locator.anchor("ann").unwrap().attr("class"), Some("author"));
        assert!(locator.anchor("an").is_none());
        assert!(locator.anchor("nothing on this page").is_none());
    }

    #[test]
    fn test_locates_and_widens_message_body() {
        let config = HarvestConfig::default();
        let located = locate(GARDEN, &config).unwrap();

        assert_eq!(located.pattern.to_string(), r#"//div[@class="message-body"]/.."#);
        assert_eq!(located.text_pattern.to_string(), r#"//div[@class="message-body"]"#);
        assert_eq!(located.assessment.element_count, 4);
        assert_eq!(located.posts.len(), 4);
        assert_eq!(located.posts[1], "bob Mulch keeps the soil moist during the hottest weeks.");
    }

    #[test]
    fn test_widening_stops_below_minimum() {
        let config = HarvestConfig::default();
        let located = locate(GARDEN, &config).unwrap();
        let doc = Document::parse(GARDEN).unwrap();

        let wider = located.pattern.widen_one_ancestor();
        assert!(wider.evaluate(&doc).len() < config.min_post_count);
    }

    #[test]
    fn test_located_selectors_match_elements() {
        let config = HarvestConfig::default();
        let doc = Document::parse(GARDEN).unwrap();
        let located = locate(GARDEN, &config).unwrap();

        let posts = located.pattern.evaluate(&doc);
        let texts = located.text_pattern.evaluate(&doc);
        assert!(!posts.is_empty());
        assert_eq!(posts.len(), located.assessment.element_count);
        assert_eq!(texts.len(), located.posts.len());
    }

    #[test]
    fn test_zebra_rows_are_refined() {
        let html = r#"
            <html><body><table class="posts"><tbody>
                <tr><td class="author">ann</td><td class="forum_message bg_7">The bus leaves the central station every twenty minutes.</td></tr>
                <tr><td class="author">bob</td><td class="forum_message bg_8">On Sundays the first departure is only at nine o'clock.</td></tr>
                <tr><td class="author">cid</td><td class="forum_message bg_7">Tickets bought from the driver cost one euro more.</td></tr>
                <tr><td class="author">dan</td><td class="forum_message bg_8">The night line follows a different route past the harbour.</td></tr>
            </tbody></table></body></html>
        "#;
        let config = HarvestConfig::default();
        let located = locate(html, &config).unwrap();

        assert_eq!(located.pattern.to_string(), "//td[contains(@class, 'forum_message')]/..");
        assert_eq!(located.posts.len(), 4);
    }

    #[test]
    fn test_form_wrapped_container_is_never_selected() {
        let html = r#"
            <html><body><div id="thread">
                <div class="entry"><form><input name="quote"></form><span class="txt">Rain is expected for most of the coming weekend.</span></div>
                <div class="entry"><form><input name="quote"></form><span class="txt">The river level rose quickly after the storm.</span></div>
                <div class="entry"><form><input name="quote"></form><span class="txt">Sandbags were handed out at the town hall.</span></div>
            </div></body></html>
        "#;
        let config = HarvestConfig::default();
        let located = locate(html, &config).unwrap();

        assert_eq!(located.pattern.to_string(), r#"//span[@class="txt"]"#);
        assert_eq!(located.posts.len(), 3);
    }

    #[test]
    fn test_single_post_is_not_extractable() {
        let html = r#"<html><body><div class="post">A single lonely text on this page.</div></body></html>"#;
        assert!(locate(html, &HarvestConfig::default()).is_none());
    }

    #[test]
    fn test_no_fragments() {
        let doc = Document::parse("<html><body></body></html>").unwrap();
        let config = HarvestConfig::default();
        assert!(PostLocator::new(&doc, &config).locate(&[]).is_none());
    }

    #[test]
    fn test_nested_matches() {
        let doc = Document::parse("<div class='a'><div class='a'>x</div></div><div class='a'>y</div>").unwrap();
        let all = doc.select("div.a").unwrap();
        assert!(has_nested_matches(&all));
        assert!(!has_nested_matches(&all[1..]));
    }
}
