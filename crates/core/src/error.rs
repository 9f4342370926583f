//! Error types for Harvest operations.
//!
//! This module defines the main error type [`HarvestError`]. Pages on which no
//! post pattern can be found are *not* errors: they produce a
//! [`PostPatternResult`](crate::PostPatternResult) whose pattern fields are all
//! `None`. Errors are reserved for bad input (URLs, selector strings,
//! configuration files) and for I/O in the fetch layer.
//!
//! # Example
//!
//! ```rust
//! use harvest_core::{HarvestError, Result};
//!
//! fn page_url(raw: &str) -> Result<url::Url> {
//!     url::Url::parse(raw).map_err(|e| HarvestError::InvalidUrl(e.to_string()))
//! }
//!
//! assert!(matches!(page_url("not a url"), Err(HarvestError::InvalidUrl(_))));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pattern inference and extraction.
#[derive(Error, Debug)]
pub enum HarvestError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// The page URL anchors permalink and profile link checks, so it must
    /// be absolute.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// A selector string could not be parsed into the supported dialect.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// File not found.
    ///
    /// Returned when attempting to read a file that doesn't exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File write errors.
    ///
    /// Wraps standard I/O errors for file operations.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// Configuration errors.
    ///
    /// Returned when a configuration file is missing fields or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::ConfigError(err.to_string())
    }
}

/// Result type alias for HarvestError.
///
/// This is a convenience alias for `std::result::Result<T, HarvestError>`.
pub type Result<T> = std::result::Result<T, HarvestError>;
