use std::collections::BTreeMap;

use serde::Serialize;

use crate::Result;
use crate::result::{ExtractionResult, PostPatternResult};

/// Complete JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Inferred selectors and post texts
    #[serde(flatten)]
    pub patterns: &'a PostPatternResult,
    /// Extracted post records, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<&'a [ExtractionResult]>,
}

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
}

/// Kinds of entities reported per post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Datetime,
    PostLink,
    PostText,
}

/// One annotated value of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub doc_id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub surface_form: String,
}

/// Entity document keyed by page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityDocument {
    pub entities: BTreeMap<String, Vec<Entity>>,
}

impl EntityDocument {
    /// Builds the document for the posts of one page.
    ///
    /// Every post contributes its user, date, link and text, in that order;
    /// missing values are left out.
    pub fn from_records(doc_id: &str, records: &[ExtractionResult]) -> Self {
        let entity = |entity_type, surface_form: String| Entity { doc_id: doc_id.to_string(), entity_type, surface_form };

        let entities = records
            .iter()
            .flat_map(|record| {
                [
                    record.user.clone().map(|user| entity(EntityType::User, user)),
                    record.date.as_ref().map(|date| entity(EntityType::Datetime, date.to_string())),
                    record.url.clone().map(|url| entity(EntityType::PostLink, url)),
                    Some(entity(EntityType::PostText, record.post_text.clone())),
                ]
            })
            .flatten()
            .collect();

        Self { entities: BTreeMap::from([(doc_id.to_string(), entities)]) }
    }
}

fn to_string<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    if pretty { Ok(serde_json::to_string_pretty(value)?) } else { Ok(serde_json::to_string(value)?) }
}

/// Convert an inference result, and optionally its records, to JSON
pub fn convert_to_json(
    result: &PostPatternResult, posts: Option<&[ExtractionResult]>, config: &JsonConfig,
) -> Result<String> {
    to_string(&JsonOutput { patterns: result, posts }, config.pretty)
}

/// Convert post records to an entity document
pub fn entities_to_json(doc_id: &str, records: &[ExtractionResult], pretty: bool) -> Result<String> {
    to_string(&EntityDocument::from_records(doc_id, records), pretty)
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, result: &PostPatternResult, posts: Option<&[ExtractionResult]>) -> Result<String> {
        convert_to_json(result, posts, &self.config)
    }

    pub fn entities(&self, doc_id: &str, records: &[ExtractionResult]) -> Result<String> {
        entities_to_json(doc_id, records, self.config.pretty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::PostDate;

    const URL: &str = "http://forum.example.org/read.php?2,736";

    fn result() -> PostPatternResult {
        let mut result = PostPatternResult::not_extractable(URL);
        result.xpath_pattern = Some(r#"//div[@class="message-body"]/.."#.parse().unwrap());
        result.xpath_score = Some(0.82);
        result.forum_posts = Some(vec!["first".into(), "second".into()]);
        result
    }

    fn records() -> Vec<ExtractionResult> {
        vec![
            ExtractionResult {
                post_text: "first".into(),
                url: Some(format!("{}#1", URL)),
                date: Some(PostDate::Text("25-February-2012 21:46".into())),
                user: Some("ann".into()),
            },
            ExtractionResult { post_text: "second".into(), url: None, date: None, user: Some("Anonymous".into()) },
        ]
    }

    #[test]
    fn test_convert_to_json_keys() {
        let json = convert_to_json(&result(), None, &JsonConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["url"], URL);
        assert_eq!(value["xpath_pattern"], r#"//div[@class="message-body"]/.."#);
        assert_eq!(value["xpath_score"], 0.82);
        assert!(value["date_xpath_pattern"].is_null());
        assert!(value.get("posts").is_none());
    }

    #[test]
    fn test_convert_to_json_with_posts() {
        let records = records();
        let json = convert_to_json(&result(), Some(records.as_slice()), &JsonConfig { pretty: true }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(json.contains('\n'));
        assert_eq!(value["posts"][0]["user"], "ann");
        assert_eq!(value["posts"][0]["date"], "25-February-2012 21:46");
        assert!(value["posts"][1]["url"].is_null());
    }

    #[test]
    fn test_entity_document() {
        let document = EntityDocument::from_records(URL, &records());
        let entities = &document.entities[URL];

        let kinds: Vec<EntityType> = entities.iter().map(|e| e.entity_type).collect();
        assert_eq!(
            kinds,
            vec![
                EntityType::User,
                EntityType::Datetime,
                EntityType::PostLink,
                EntityType::PostText,
                EntityType::User,
                EntityType::PostText
            ]
        );
        assert!(entities.iter().all(|e| e.doc_id == URL));
    }

    #[test]
    fn test_entities_to_json_shape() {
        let json = entities_to_json(URL, &records()[..1], false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["entities"][URL][0]["type"], "user");
        assert_eq!(value["entities"][URL][1]["type"], "datetime");
        assert_eq!(value["entities"][URL][2]["type"], "post_link");
        assert_eq!(value["entities"][URL][3]["surface_form"], "first");
    }

    #[test]
    fn test_json_formatter() {
        let formatter = JsonFormatter::new(JsonConfig::default());
        let records = records();

        assert_eq!(
            formatter.convert(&result(), Some(records.as_slice())).unwrap(),
            convert_to_json(&result(), Some(records.as_slice()), &JsonConfig::default()).unwrap()
        );
        assert_eq!(formatter.entities(URL, &records).unwrap(), entities_to_json(URL, &records, false).unwrap());
    }
}
