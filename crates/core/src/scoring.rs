use crate::config::HarvestConfig;
use crate::parse::{Document, Element};
use crate::selector::Path;
use crate::similarity::SimilarityScorer;

/// Score of a candidate post selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    /// Similarity to the reference content, after penalty and bonus
    pub score: f64,
    /// Number of matched elements
    pub element_count: usize,
}

impl Assessment {
    /// The outcome for selectors that can never denote posts
    pub const REJECTED: Assessment = Assessment { score: 0.0, element_count: 1 };

    /// Ordering key: score first, then match count
    pub fn key(&self) -> (f64, usize) {
        (self.score, self.element_count)
    }

    /// Whether this assessment ranks strictly above `other`
    pub fn beats(&self, other: &Assessment) -> bool {
        self.score > other.score || (self.score == other.score && self.element_count > other.element_count)
    }
}

/// Whether any matched element contains a blacklisted tag below it
pub fn contains_blacklisted_descendant(elements: &[Element<'_>], blacklist: &[String]) -> bool {
    elements
        .iter()
        .flat_map(|el| el.descendants())
        .any(|d| blacklist.iter().any(|tag| tag == d.tag_name()))
}

/// Whether a class word of the path's last class predicate contains a rewarded substring
pub fn has_rewarded_class(path: &Path, reward_classes: &[String]) -> bool {
    path.last_class().is_some_and(|class| {
        class.words().iter().any(|word| {
            let word = word.to_lowercase();
            reward_classes.iter().any(|reward| word.contains(reward.as_str()))
        })
    })
}

/// Scores a candidate post selector against the reference content.
///
/// Matches containing a blacklisted tag reject the selector outright, as does
/// a match text without tokens. Unrelated text keeps its match count. A selector whose own steps name a blacklisted tag is
/// penalized; otherwise a rewarded class earns a bonus when `reward` is set.
pub fn assess(doc: &Document, path: &Path, scorer: &SimilarityScorer, config: &HarvestConfig, reward: bool) -> Assessment {
    if path.steps.is_empty() {
        return Assessment::REJECTED;
    }

    let elements = path.evaluate(doc);
    if contains_blacklisted_descendant(&elements, &config.blacklist_tags) {
        tracing::debug!(selector = %path, "Rejected selector containing blacklisted tags");
        return Assessment::REJECTED;
    }

    let text = elements.iter().map(Element::text).collect::<Vec<_>>().join(" ");
    let Some(similarity) = scorer.try_score(&text) else {
        tracing::warn!(selector = %path, "Cannot compute similarity for empty text");
        return Assessment::REJECTED;
    };

    let score = if path.names_any_tag(&config.blacklist_tags) {
        similarity / config.blacklist_penalty
    } else if reward && has_rewarded_class(path, &config.reward_classes) {
        similarity + config.reward_bonus
    } else {
        similarity
    };

    Assessment { score, element_count: elements.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use crate::similarity::DEFAULT_VSM_SIZE;

    const PAGE: &str = r#"
        <html><body>
            <form id="thread">
                <div class="message-body">alpha beta gamma</div>
                <div class="message-body">delta epsilon zeta</div>
                <div class="message-body">eta theta iota</div>
            </form>
            <div class="box"><p>alpha beta gamma</p></div>
            <div class="box"><p>delta epsilon zeta</p><form><input name="q"></form></div>
            <span class="note">omicron</span><span class="note">omega</span>
        </body></html>
    "#;

    const REFERENCE: &str = "alpha beta gamma delta epsilon zeta eta theta iota";

    fn path(raw: &str) -> Path {
        raw.parse::<Selector>().unwrap().as_path().unwrap().clone()
    }

    fn score(raw: &str, reward: bool) -> Assessment {
        let doc = Document::parse(PAGE).unwrap();
        let scorer = SimilarityScorer::new(REFERENCE, DEFAULT_VSM_SIZE);
        assess(&doc, &path(raw), &scorer, &HarvestConfig::default(), reward)
    }

    #[test]
    fn test_plain_similarity() {
        let result = score(r#"//div[@class="message-body"]"#, false);
        assert_eq!(result.element_count, 3);
        assert!((result.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_reward_bonus() {
        let result = score(r#"//div[@class="message-body"]"#, true);
        assert!((result.score - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_blacklisted_descendant_rejects() {
        assert_eq!(score(r#"//div[@class="box"]"#, true), Assessment::REJECTED);
        assert_eq!(score("//body", false), Assessment::REJECTED);
    }

    #[test]
    fn test_blacklisted_step_is_penalized() {
        let result = score(r#"//form/div[@class="message-body"]"#, true);
        assert_eq!(result.element_count, 3);
        assert!((result.score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_no_matches_rejects() {
        assert_eq!(score(r#"//div[@class="missing"]"#, true), Assessment::REJECTED);
    }

    #[test]
    fn test_unrelated_text_keeps_match_count() {
        let result = score(r#"//span[@class="note"]"#, false);
        assert_eq!(result.element_count, 2);
        assert!(result.score < 0.5);
    }

    #[test]
    fn test_rewarded_class_uses_last_class_step() {
        assert!(has_rewarded_class(&path(r#"//div[@class="Post-Wrapper x"]/span"#), &["wrapper".to_string()]));
        assert!(!has_rewarded_class(&path("//div/span"), &["post".to_string()]));
        assert!(has_rewarded_class(
            &path("//td[contains(@class, 'forum_message')]/.."),
            &["message".to_string()]
        ));
    }

    #[test]
    fn test_beats() {
        let a = Assessment { score: 0.5, element_count: 3 };
        let b = Assessment { score: 0.5, element_count: 4 };
        assert!(b.beats(&a));
        assert!(!a.beats(&b));
        assert!(!a.beats(&a));
    }
}
