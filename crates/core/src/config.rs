//! Tuning knobs for pattern inference.
//!
//! Every constant the heuristics depend on lives in [`HarvestConfig`], which is
//! passed explicitly to the orchestrator. Defaults reproduce the hand-tuned
//! values; a JSON file may override any subset of them.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::HarvestConfig;
//!
//! let config = HarvestConfig::builder()
//!     .min_post_count(4)
//!     .footer_markers(vec!["copyright".into(), "powered by".into()])
//!     .build()
//!     .unwrap();
//! assert_eq!(config.min_post_count, 4);
//!
//! let from_json = HarvestConfig::from_json(r#"{ "vsm_size": 1024 }"#).unwrap();
//! assert_eq!(from_json.vsm_size, 1024);
//! assert_eq!(from_json.min_post_count, 3);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{HarvestError, Result};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Configuration for post and metadata pattern inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Tags that can never occur inside a post (default: option, footer, form, head, tfoot).
    pub blacklist_tags: Vec<String>,

    /// Divisor applied when a selector's own steps name a blacklisted tag (default: 10.0).
    pub blacklist_penalty: f64,

    /// Tags whose text is never a post body: headings and anchors.
    pub non_body_tags: Vec<String>,

    /// Minimum number of matches a post selector must keep while widening (default: 3).
    pub min_post_count: usize,

    /// Number of buckets of the hashed bag-of-words vectors (default: 5000).
    pub vsm_size: usize,

    /// Characters of a text fragment compared when anchoring it to a node (default: 30).
    pub match_prefix_size: usize,

    /// Class substrings that earn a bonus (default: content, message, post, wrapper).
    pub reward_classes: Vec<String>,

    /// Bonus added for a rewarded class (default: 0.1).
    pub reward_bonus: f64,

    /// Case-insensitive markers that end the reference content (default: copyright).
    pub footer_markers: Vec<String>,

    /// Longest text still considered a date mention (default: 120).
    pub max_date_text_len: usize,

    /// Languages for date recognition (default: en, de, es).
    pub date_languages: Vec<String>,

    /// Allowed difference between the link match count and the post count (default: 2).
    pub link_count_slack: usize,

    /// Surplus date matches tolerated over the post count (default: 2).
    pub date_count_slack: usize,

    /// Boilerplate terms that disqualify user name candidates.
    pub forbidden_user_terms: Vec<String>,

    /// Substrings of selectors or link targets that hint at user profiles.
    pub user_hints: Vec<String>,

    /// Shortest common leading word run removed from posts (default: 2).
    pub min_prefix_words: usize,

    /// Shortest common trailing word run removed from posts (default: 1).
    pub min_suffix_words: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            blacklist_tags: strings(&["option", "footer", "form", "head", "tfoot"]),
            blacklist_penalty: 10.0,
            non_body_tags: strings(&["h1", "h2", "h3", "h4", "h5", "a"]),
            min_post_count: 3,
            vsm_size: 5000,
            match_prefix_size: 30,
            reward_classes: strings(&["content", "message", "post", "wrapper"]),
            reward_bonus: 0.1,
            footer_markers: strings(&["copyright"]),
            max_date_text_len: 120,
            date_languages: strings(&["en", "de", "es"]),
            link_count_slack: 2,
            date_count_slack: 2,
            forbidden_user_terms: strings(&[
                "reply",
                "report",
                "quote",
                "terms of use",
                "privacy",
                "permalink",
                "share",
                "login",
                "log in",
                "register",
                "sign in",
                "sign up",
                "edit",
                "delete",
                "back to top",
                "print",
                "subscribe",
                "bookmark",
                "flag",
                "post reply",
                "forum home",
            ]),
            user_hints: strings(&["user", "member", "person", "profile"]),
            min_prefix_words: 2,
            min_suffix_words: 1,
        }
    }
}

impl HarvestConfig {
    /// Creates a new builder for HarvestConfig.
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::new()
    }

    /// Reads a configuration from JSON. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ConfigError`] on malformed JSON or wrongly typed values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: HarvestConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::FileNotFound`] if the file does not exist, or
    /// [`HarvestError::ConfigError`] if it cannot be parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HarvestError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| HarvestError::ConfigError(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.min_post_count < 2 {
            return Err(HarvestError::ConfigError("min_post_count must be at least 2".to_string()));
        }
        if self.vsm_size == 0 {
            return Err(HarvestError::ConfigError("vsm_size must be positive".to_string()));
        }
        if self.match_prefix_size == 0 {
            return Err(HarvestError::ConfigError("match_prefix_size must be positive".to_string()));
        }
        if self.blacklist_penalty <= 0.0 {
            return Err(HarvestError::ConfigError("blacklist_penalty must be positive".to_string()));
        }
        Ok(())
    }
}

/// Builder for HarvestConfig.
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: HarvestConfig::default() }
    }

    pub fn blacklist_tags(mut self, value: Vec<String>) -> Self {
        self.config.blacklist_tags = value;
        self
    }

    pub fn min_post_count(mut self, value: usize) -> Self {
        self.config.min_post_count = value;
        self
    }

    pub fn vsm_size(mut self, value: usize) -> Self {
        self.config.vsm_size = value;
        self
    }

    pub fn match_prefix_size(mut self, value: usize) -> Self {
        self.config.match_prefix_size = value;
        self
    }

    pub fn reward_classes(mut self, value: Vec<String>) -> Self {
        self.config.reward_classes = value;
        self
    }

    pub fn reward_bonus(mut self, value: f64) -> Self {
        self.config.reward_bonus = value;
        self
    }

    pub fn footer_markers(mut self, value: Vec<String>) -> Self {
        self.config.footer_markers = value;
        self
    }

    pub fn max_date_text_len(mut self, value: usize) -> Self {
        self.config.max_date_text_len = value;
        self
    }

    pub fn date_languages(mut self, value: Vec<String>) -> Self {
        self.config.date_languages = value;
        self
    }

    pub fn forbidden_user_terms(mut self, value: Vec<String>) -> Self {
        self.config.forbidden_user_terms = value;
        self
    }

    pub fn user_hints(mut self, value: Vec<String>) -> Self {
        self.config.user_hints = value;
        self
    }

    /// Sets the shortest leading and trailing runs the trimmer removes.
    pub fn trim_run_lengths(mut self, prefix: usize, suffix: usize) -> Self {
        self.config.min_prefix_words = prefix;
        self.config.min_suffix_words = suffix;
        self
    }

    /// Builds the config.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ConfigError`] if a value is out of range.
    pub fn build(self) -> Result<HarvestConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for HarvestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
