pub mod json;
pub mod text;

pub use json::{Entity, EntityDocument, EntityType, JsonConfig, JsonFormatter, convert_to_json, entities_to_json};
pub use text::{TextConfig, TextFormatter, convert_to_text};
