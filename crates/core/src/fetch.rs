//! Page retrieval from URLs, files, and stdin.
//!
//! Forum pages are usually read from a URL, but saved copies work as well.
//! Pattern inference needs the page URL in every case, so [`fetch_url`]
//! reports the address it finally landed on after redirects.

use std::fs;
use std::path::PathBuf;

#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
#[cfg(feature = "fetch")]
use url::Url;

use crate::{HarvestError, Result};

/// HTTP client configuration for fetching forum pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; Harvest/1.0; forum post extraction)".to_string() }
    }
}

/// A downloaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    pub html: String,
}

/// Downloads a page over HTTP(S).
///
/// Redirects are followed and non-success status codes are errors.
///
/// # Errors
///
/// Returns [`HarvestError::InvalidUrl`] for anything but an absolute http(s)
/// URL, [`HarvestError::Timeout`] when the request exceeds
/// `config.timeout`, and [`HarvestError::HttpError`] for other failures.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<FetchedPage> {
    let parsed_url = Url::parse(url).map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", url, e)))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(HarvestError::InvalidUrl(format!("{}: only http and https pages can be fetched", url)));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(HarvestError::HttpError)?;

    tracing::debug!(url, "Fetching page");
    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() { HarvestError::Timeout { timeout: config.timeout } } else { HarvestError::HttpError(e) }
        })?
        .error_for_status()?;

    let final_url = response.url().to_string();
    if final_url != url {
        tracing::debug!(from = url, to = %final_url, "Followed redirect");
    }
    let html = response.text().await?;

    Ok(FetchedPage { url: final_url, html })
}

/// Reads a saved page from a local file.
///
/// # Errors
///
/// Returns [`HarvestError::FileNotFound`] if `path` does not exist.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(HarvestError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(HarvestError::from)
    }
}

/// Reads a page from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Harvest"));
    }

    #[cfg(feature = "fetch")]
    fn fetch_blocking(url: &'static str) -> Result<FetchedPage> {
        let config = FetchConfig::default();
        std::thread::spawn(move || tokio::runtime::Runtime::new().unwrap().block_on(fetch_url(url, &config)))
            .join()
            .unwrap()
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_fetch_url_invalid() {
        assert!(matches!(fetch_blocking("not-a-url"), Err(HarvestError::InvalidUrl(_))));
    }

    #[cfg(feature = "fetch")]
    #[test]
    fn test_fetch_url_rejects_other_schemes() {
        assert!(matches!(fetch_blocking("ftp://forum.example.org/t/1"), Err(HarvestError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/thread.html");
        assert!(matches!(result, Err(HarvestError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_saved_page() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<div class=\"post\">saved</div>").unwrap();

        let html = fetch_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(html, "<div class=\"post\">saved</div>");
    }
}
