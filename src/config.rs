use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for one mirror run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// URL to start crawling from; its origin defines the crawl boundary
    pub start_url: String,

    /// Directory receiving pages/, images/, css/, fonts/ and metadata.json
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory holding the hand-authored basic site
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Per-navigation timeout in seconds
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Time to wait after navigation for dynamic content to settle
    #[serde(default = "default_settle_millis")]
    pub settle_millis: u64,

    /// Optional cap on the number of pages visited in one run
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub max_pages: Option<usize>,
}

impl MirrorConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            output_dir: default_output_dir(),
            public_dir: default_public_dir(),
            webdriver_url: default_webdriver_url(),
            navigation_timeout_secs: default_navigation_timeout(),
            settle_millis: default_settle_millis(),
            max_pages: None,
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Override the WebDriver URL with an environment variable if provided
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }
}

/// Default output directory for scraped content
fn default_output_dir() -> String {
    "./scraped-content".to_string()
}

/// Default directory for the hand-authored basic site
fn default_public_dir() -> String {
    "./public".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default per-navigation timeout
fn default_navigation_timeout() -> u64 {
    30
}

/// Default settle wait after navigation
fn default_settle_millis() -> u64 {
    3000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MirrorConfig::new("https://example.com/");
        assert_eq!(config.start_url, "https://example.com/");
        assert_eq!(config.output_dir, "./scraped-content");
        assert_eq!(config.public_dir, "./public");
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.navigation_timeout_secs, 30);
        assert_eq!(config.settle_millis, 3000);
        assert!(config.max_pages.is_none());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: MirrorConfig =
            serde_json::from_str(r#"{"start_url": "https://example.com/"}"#).unwrap();
        assert_eq!(config.webdriver_url, "http://localhost:4444");
        assert_eq!(config.output_dir, "./scraped-content");
        assert!(config.max_pages.is_none());

        let config: MirrorConfig = serde_json::from_str(
            r#"{"start_url": "https://example.com/", "max_pages": 25, "settle_millis": 500}"#,
        )
        .unwrap();
        assert_eq!(config.max_pages, Some(25));
        assert_eq!(config.settle_millis, 500);
    }
}
