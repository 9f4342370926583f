pub mod cleanup;
pub mod config;
pub mod dates;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod harvester;
pub mod metadata;
pub mod oracle;
pub mod parse;
pub mod posts;
pub mod preprocess;
pub mod result;
pub mod scoring;
pub mod selector;
pub mod similarity;

pub use cleanup::trim_boilerplate;
pub use config::{HarvestConfig, HarvestConfigBuilder};
pub use dates::DateRecognizer;
pub use error::{HarvestError, Result};
pub use extract::{ANONYMOUS, PostSelectors};
pub use fetch::{FetchConfig, fetch_file, fetch_stdin};
#[cfg(feature = "fetch")]
pub use fetch::{FetchedPage, fetch_url};
pub use formatters::{EntityDocument, JsonConfig, JsonFormatter, TextConfig, TextFormatter};
pub use formatters::{convert_to_json, convert_to_text, entities_to_json};
pub use harvester::{Harvester, extract_posts, locate_post_pattern};
pub use metadata::user_identifier;
pub use oracle::{ContentOracle, PageTextOracle};
pub use parse::Document;
#[doc(hidden)]
pub use preprocess::{PreprocessConfig, preprocess_html};
pub use result::{ExtractionResult, PostDate, PostPatternResult};
#[doc(hidden)]
pub use scoring::{Assessment, assess};
pub use selector::{Path, Selector};
pub use similarity::{SimilarityScorer, fuzzy_ratio};
