//! Output records of pattern inference and post extraction.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::selector::Selector;

/// Selectors inferred for one forum page.
///
/// A page without any repeating post pattern yields a result whose pattern
/// fields are all `None`; metadata selectors may be missing individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPatternResult {
    /// Page URL the patterns were inferred for.
    pub url: String,

    /// Selector matching one container element per post.
    pub xpath_pattern: Option<Selector>,

    /// Similarity of the post matches to the page's reference content.
    pub xpath_score: Option<f64>,

    /// Boilerplate-trimmed text of every post.
    pub forum_posts: Option<Vec<String>>,

    /// Narrowest selector yielding one text element per post.
    pub text_xpath_pattern: Option<Selector>,

    /// Selector of each post's permalink.
    pub url_xpath_pattern: Option<Selector>,

    /// Selector of each post's timestamp.
    pub date_xpath_pattern: Option<Selector>,

    /// Selector of each post's author.
    pub user_xpath_pattern: Option<Selector>,
}

impl PostPatternResult {
    /// The result for a page whose posts could not be located.
    pub fn not_extractable(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            xpath_pattern: None,
            xpath_score: None,
            forum_posts: None,
            text_xpath_pattern: None,
            url_xpath_pattern: None,
            date_xpath_pattern: None,
            user_xpath_pattern: None,
        }
    }

    /// Whether a post pattern was found.
    pub fn is_extractable(&self) -> bool {
        self.xpath_pattern.is_some()
    }

    /// Number of posts found, zero when not extractable.
    pub fn post_count(&self) -> usize {
        self.forum_posts.as_ref().map_or(0, Vec::len)
    }
}

/// Date of a post, either as written on the page or resolved to a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostDate {
    DateTime(NaiveDateTime),
    Text(String),
}

impl std::fmt::Display for PostDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostDate::DateTime(date) => write!(f, "{}", date.format("%Y-%m-%d %H:%M:%S")),
            PostDate::Text(text) => f.write_str(text),
        }
    }
}

/// One extracted post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub post_text: String,
    pub url: Option<String>,
    pub date: Option<PostDate>,
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_not_extractable_serializes_nulls() {
        let result = PostPatternResult::not_extractable("http://forum.example.org/t/1");
        let json = serde_json::to_value(&result).unwrap();

        assert!(!result.is_extractable());
        assert_eq!(result.post_count(), 0);
        assert_eq!(json["url"], "http://forum.example.org/t/1");
        assert!(json["xpath_pattern"].is_null());
        assert!(json["user_xpath_pattern"].is_null());
    }

    #[test]
    fn test_selectors_serialize_as_strings() {
        let mut result = PostPatternResult::not_extractable("http://forum.example.org/t/1");
        result.xpath_pattern = Some(r#"//div[@class="post"]/.."#.parse().unwrap());
        result.forum_posts = Some(vec!["a".into(), "b".into()]);

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""xpath_pattern":"//div[@class=\"post\"]/..""#));

        let back: PostPatternResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert_eq!(back.post_count(), 2);
    }

    #[test]
    fn test_post_date_forms() {
        let date = NaiveDate::from_ymd_opt(2012, 2, 25).unwrap().and_hms_opt(21, 46, 0).unwrap();

        let json = serde_json::to_string(&PostDate::DateTime(date)).unwrap();
        assert_eq!(json, r#""2012-02-25T21:46:00""#);
        assert_eq!(serde_json::from_str::<PostDate>(&json).unwrap(), PostDate::DateTime(date));

        let text: PostDate = serde_json::from_str(r#""25-February-2012 21:46""#).unwrap();
        assert_eq!(text, PostDate::Text("25-February-2012 21:46".into()));
        assert_eq!(PostDate::DateTime(date).to_string(), "2012-02-25 21:46:00");
    }
}
