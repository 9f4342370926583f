//! Post record extraction from inferred selectors.
//!
//! The selectors in a [`PostPatternResult`] are re-evaluated on the page and
//! their matches zipped index-wise into one [`ExtractionResult`] per post.
//! Missing metadata is filled in: permalinks become `page#1`, `page#2`, ...
//! and posts without an author are attributed to `"Anonymous"`.

use url::Url;

use crate::cleanup::trim_boilerplate;
use crate::config::HarvestConfig;
use crate::dates::{DateRecognizer, parse_datetime_attr};
use crate::metadata::date::cleaned_text;
use crate::parse::{Document, Element};
use crate::result::{ExtractionResult, PostDate, PostPatternResult};
use crate::selector::Selector;

/// Author recorded for posts without a matched user.
pub const ANONYMOUS: &str = "Anonymous";

/// The selectors driving extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSelectors {
    pub post: Selector,
    pub link: Option<Selector>,
    pub date: Option<Selector>,
    pub user: Option<Selector>,
}

impl PostSelectors {
    /// Selectors of an inference result, preferring the text selector for
    /// post bodies. `None` when the page was not extractable.
    pub fn from_result(result: &PostPatternResult) -> Option<Self> {
        let post = result.text_xpath_pattern.as_ref().or(result.xpath_pattern.as_ref())?.clone();
        Some(Self {
            post,
            link: result.url_xpath_pattern.clone(),
            date: result.date_xpath_pattern.clone(),
            user: result.user_xpath_pattern.clone(),
        })
    }
}

/// Extracts post records from one parsed page.
pub struct PostExtractor<'a> {
    doc: &'a Document,
    base_url: &'a Url,
    config: &'a HarvestConfig,
    dates: &'a DateRecognizer,
}

impl<'a> PostExtractor<'a> {
    pub fn new(doc: &'a Document, base_url: &'a Url, config: &'a HarvestConfig, dates: &'a DateRecognizer) -> Self {
        Self { doc, base_url, config, dates }
    }

    /// One record per match of the post selector.
    ///
    /// With `result_as_datetime` dates are resolved timestamps, otherwise the
    /// date text as written on the page.
    pub fn extract(&self, selectors: &PostSelectors, result_as_datetime: bool) -> Vec<ExtractionResult> {
        let texts: Vec<String> = self.doc.query(&selectors.post).iter().map(Element::text).collect();
        let posts = trim_boilerplate(&texts, self.config.min_prefix_words, self.config.min_suffix_words);

        let urls: Vec<Option<String>> = match &selectors.link {
            Some(link) => self.doc.query(link).iter().map(|el| self.reference_url(el)).collect(),
            None => (1..=posts.len()).map(|i| self.fragment_url(&i.to_string())).collect(),
        };
        let dates: Vec<Option<PostDate>> = selectors
            .date
            .as_ref()
            .map(|date| self.doc.query(date).iter().map(|el| self.post_date(el, result_as_datetime)).collect())
            .unwrap_or_default();
        let users: Vec<String> = selectors
            .user
            .as_ref()
            .map(|user| self.doc.query_texts(user))
            .unwrap_or_default();

        if urls.len() != posts.len() || (selectors.date.is_some() && dates.len() != posts.len()) {
            tracing::debug!(
                posts = posts.len(),
                urls = urls.len(),
                dates = dates.len(),
                "Metadata match counts differ from post count"
            );
        }

        posts
            .into_iter()
            .enumerate()
            .map(|(i, post_text)| {
                let user = users.get(i).filter(|name| !name.trim().is_empty()).map_or(ANONYMOUS, String::as_str);
                ExtractionResult {
                    post_text,
                    url: urls.get(i).cloned().flatten(),
                    date: dates.get(i).cloned().flatten(),
                    user: Some(user.to_string()),
                }
            })
            .collect()
    }

    /// `page#name` for named anchors, the resolved target for links.
    fn reference_url(&self, element: &Element<'_>) -> Option<String> {
        if let Some(name) = element.attr("name") {
            return self.fragment_url(name);
        }
        let href = element.attr("href")?;
        self.base_url.join(href).ok().map(String::from)
    }

    fn fragment_url(&self, fragment: &str) -> Option<String> {
        self.base_url.join(&format!("#{}", fragment)).ok().map(String::from)
    }

    fn post_date(&self, element: &Element<'_>, result_as_datetime: bool) -> Option<PostDate> {
        if element.tag_name() == "time"
            && let Some(value) = element.attr("datetime")
            && let Some(date) = parse_datetime_attr(value)
        {
            return Some(if result_as_datetime { PostDate::DateTime(date) } else { PostDate::Text(value.trim().to_string()) });
        }

        let found = self.dates.most_recent(&cleaned_text(element))?;
        Some(if result_as_datetime { PostDate::DateTime(found.date) } else { PostDate::Text(found.surface) })
    }
}
