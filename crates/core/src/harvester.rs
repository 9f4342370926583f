//! Main inference and extraction API.
//!
//! The entry point is the [`Harvester`] struct, along with the convenience
//! functions [`locate_post_pattern`] and [`extract_posts`].
//!
//! # Example
//!
//! ```rust
//! use harvest_core::harvester::Harvester;
//!
//! let html = r#"<html><body>
//!     <div class="post"><div class="text">Rain barrels fill up quickly in April</div></div>
//!     <div class="post"><div class="text">Mine overflowed twice during the storm</div></div>
//!     <div class="post"><div class="text">A diverter on the downpipe solves that</div></div>
//! </body></html>"#;
//!
//! let harvester = Harvester::new();
//! let result = harvester.locate(html, "http://forum.example.org/t/42").unwrap();
//! assert_eq!(result.forum_posts.as_ref().map(Vec::len), Some(3));
//!
//! let posts = harvester.extract(html, "http://forum.example.org/t/42", &result, false).unwrap();
//! assert_eq!(posts[0].url.as_deref(), Some("http://forum.example.org/t/42#1"));
//! ```

use url::Url;

use crate::config::HarvestConfig;
use crate::dates::DateRecognizer;
use crate::extract::{PostExtractor, PostSelectors};
use crate::metadata::{SearchContext, find_date_pattern, find_link_pattern, find_user_pattern};
use crate::oracle::{ContentOracle, PageTextOracle};
use crate::parse::Document;
use crate::posts::{PostLocator, reference_fragments};
use crate::result::{ExtractionResult, PostPatternResult};
use crate::selector::Selector;
use crate::{HarvestError, Result};

#[cfg(feature = "fetch")]
use crate::fetch::{FetchConfig, fetch_url};

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Infers post patterns and extracts posts from forum pages.
///
/// A harvester only holds configuration, so one instance can serve any
/// number of pages, from several threads at once.
pub struct Harvester {
    config: HarvestConfig,
    oracle: Box<dyn ContentOracle>,
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new()
    }
}

impl Harvester {
    /// Creates a harvester with default settings and the built-in page text oracle.
    pub fn new() -> Self {
        Self::with_config(HarvestConfig::default())
    }

    /// Creates a harvester with a custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use harvest_core::{HarvestConfig, Harvester};
    ///
    /// let config = HarvestConfig::builder().min_post_count(2).build().unwrap();
    /// let harvester = Harvester::with_config(config);
    /// assert_eq!(harvester.config().min_post_count, 2);
    /// ```
    pub fn with_config(config: HarvestConfig) -> Self {
        Self { config, oracle: Box::new(PageTextOracle::new()) }
    }

    /// Creates a harvester that takes its reference content from `oracle`.
    pub fn with_oracle(oracle: Box<dyn ContentOracle>) -> Self {
        Self::with_config_and_oracle(HarvestConfig::default(), oracle)
    }

    pub fn with_config_and_oracle(config: HarvestConfig, oracle: Box<dyn ContentOracle>) -> Self {
        Self { config, oracle }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Infers the post, text, link, date and user selectors of a page.
    ///
    /// A page without repeating posts is not an error: the result then has
    /// no patterns (see [`PostPatternResult::is_extractable`]).
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidUrl`] if `url` cannot be parsed.
    pub fn locate(&self, html: &str, url: &str) -> Result<PostPatternResult> {
        let base_url = parse_url(url)?;
        let lines = self.oracle.extract_main_text(html);
        let fragments = reference_fragments(&lines, &self.config.footer_markers);
        tracing::debug!(lines = lines.len(), fragments = fragments.len(), "Reference content");

        let doc = Document::parse(html)?;
        let Some(located) = PostLocator::new(&doc, &self.config).locate(&fragments) else {
            tracing::warn!(url, "No post pattern found; page is not extractable");
            return Ok(PostPatternResult::not_extractable(url));
        };

        let dates = self.date_recognizer()?;
        let ctx = SearchContext {
            doc: &doc,
            base_url: &base_url,
            post_count: located.posts.len(),
            config: &self.config,
            dates: &dates,
        };
        let link = find_link_pattern(&ctx, &located.pattern);
        let date = find_date_pattern(&ctx, &located.pattern);
        let user = find_user_pattern(&ctx, &located.pattern);

        Ok(PostPatternResult {
            url: url.to_string(),
            xpath_pattern: Some(located.pattern.into()),
            xpath_score: Some(located.assessment.score),
            forum_posts: Some(located.posts),
            text_xpath_pattern: Some(located.text_pattern.into()),
            url_xpath_pattern: link.map(Selector::from),
            date_xpath_pattern: date.map(Selector::from),
            user_xpath_pattern: user,
        })
    }

    /// Extracts one record per post using previously inferred selectors.
    ///
    /// Returns no records for a result that is not extractable.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidUrl`] if `url` cannot be parsed.
    pub fn extract(
        &self, html: &str, url: &str, result: &PostPatternResult, result_as_datetime: bool,
    ) -> Result<Vec<ExtractionResult>> {
        match PostSelectors::from_result(result) {
            Some(selectors) => self.extract_with(html, url, &selectors, result_as_datetime),
            None => Ok(Vec::new()),
        }
    }

    /// Extracts one record per match of `selectors.post`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::InvalidUrl`] if `url` cannot be parsed.
    pub fn extract_with(
        &self, html: &str, url: &str, selectors: &PostSelectors, result_as_datetime: bool,
    ) -> Result<Vec<ExtractionResult>> {
        let base_url = parse_url(url)?;
        let doc = Document::parse(html)?;
        let dates = self.date_recognizer()?;
        Ok(PostExtractor::new(&doc, &base_url, &self.config, &dates).extract(selectors, result_as_datetime))
    }

    fn date_recognizer(&self) -> Result<DateRecognizer> {
        DateRecognizer::new(&self.config.date_languages).or_else(|e| {
            tracing::warn!(error = %e, "Falling back to English date recognition");
            DateRecognizer::new(&["en".to_string()])
        })
    }

    /// Fetches a page and infers its patterns, using the final URL after
    /// redirects as the page URL.
    #[cfg(feature = "fetch")]
    pub async fn fetch_and_locate(&self, url: &str, fetch_config: &FetchConfig) -> Result<(String, PostPatternResult)> {
        let page = fetch_url(url, fetch_config).await?;
        let result = self.locate(&page.html, &page.url)?;
        Ok((page.html, result))
    }
}

/// Infers the post patterns of a page with default settings.
///
/// # Errors
///
/// Returns [`HarvestError::InvalidUrl`] if `url` cannot be parsed.
pub fn locate_post_pattern(html: &str, url: &str) -> Result<PostPatternResult> {
    Harvester::new().locate(html, url)
}

/// Extracts post records from a page given its post and metadata selectors.
///
/// # Errors
///
/// Returns [`HarvestError::InvalidUrl`] if `url` cannot be parsed.
pub fn extract_posts(
    html: &str, url: &str, post: &Selector, link: Option<&Selector>, date: Option<&Selector>, user: Option<&Selector>,
    result_as_datetime: bool,
) -> Result<Vec<ExtractionResult>> {
    let selectors = PostSelectors { post: post.clone(), link: link.cloned(), date: date.cloned(), user: user.cloned() };
    Harvester::new().extract_with(html, url, &selectors, result_as_datetime)
}
