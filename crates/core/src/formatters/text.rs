use crate::result::{ExtractionResult, PostPatternResult};

/// Configuration for plain text output
#[derive(Debug, Clone, Default)]
pub struct TextConfig {
    /// Wrap post text at specified width (0 = no wrapping)
    pub line_width: usize,

    /// Include the selector summary header
    pub include_header: bool,
}

/// Plain text formatter for human-readable reports
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, result: &PostPatternResult, posts: Option<&[ExtractionResult]>) -> String {
        convert_to_text(result, posts, &self.config)
    }
}

/// Render an inference result as text.
///
/// Post records are listed when given, otherwise the located post texts.
pub fn convert_to_text(result: &PostPatternResult, posts: Option<&[ExtractionResult]>, config: &TextConfig) -> String {
    let mut output = String::new();

    if config.include_header {
        output.push_str(&generate_header(result));
        output.push('\n');
    }

    if !result.is_extractable() {
        output.push_str("No forum posts found.");
        return output.trim().to_string();
    }

    let blocks: Vec<String> = match posts {
        Some(records) => records.iter().enumerate().map(|(i, r)| record_block(i + 1, r, config.line_width)).collect(),
        None => result
            .forum_posts
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, text)| format!("#{}\n{}", i + 1, wrap_text(text, config.line_width)))
            .collect(),
    };
    output.push_str(&blocks.join("\n\n"));

    output.trim().to_string()
}

/// Generate a header listing the inferred selectors
fn generate_header(result: &PostPatternResult) -> String {
    let title = format!("Posts of {}", result.url);
    let mut header = format!("{}\n{}\n", title, "=".repeat(title.chars().count()));

    let rows = [
        ("Posts", &result.xpath_pattern),
        ("Text", &result.text_xpath_pattern),
        ("Link", &result.url_xpath_pattern),
        ("Date", &result.date_xpath_pattern),
        ("User", &result.user_xpath_pattern),
    ];
    for (label, selector) in rows {
        let value = selector.as_ref().map_or_else(|| "-".to_string(), ToString::to_string);
        header.push_str(&format!("{:<7}{}\n", format!("{}:", label), value));
    }
    if let Some(score) = result.xpath_score {
        header.push_str(&format!("Score: {:.3} over {} posts\n", score, result.post_count()));
    }

    header
}

fn record_block(index: usize, record: &ExtractionResult, width: usize) -> String {
    let mut meta_parts = vec![format!("#{}", index)];

    if let Some(user) = &record.user {
        meta_parts.push(format!("By: {}", user));
    }

    if let Some(date) = &record.date {
        meta_parts.push(format!("Date: {}", date));
    }

    if let Some(url) = &record.url {
        meta_parts.push(url.clone());
    }

    format!("{}\n{}", meta_parts.join(" | "), wrap_text(&record.post_text, width))
}

/// Wrap text to specified line width
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut lines = Vec::new();
    let mut current_line: Vec<&str> = Vec::new();
    let mut current_length = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_length == 0 {
            current_line.push(word);
            current_length = word_len;
        } else if current_length + 1 + word_len <= width {
            current_length += 1 + word_len;
            current_line.push(word);
        } else {
            lines.push(current_line.join(" "));
            current_line = vec![word];
            current_length = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}
