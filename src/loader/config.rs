use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    /// Headless Chrome; renders client-side markup
    Chrome,
    /// Plain HTTP GET; only sees server-rendered markup
    Http,
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderKind::Chrome => f.write_str("chrome"),
            LoaderKind::Http => f.write_str("http"),
        }
    }
}

impl FromStr for LoaderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chrome" => Ok(LoaderKind::Chrome),
            "http" => Ok(LoaderKind::Http),
            other => Err(format!("Unknown loader: {}. Use 'chrome' or 'http'", other)),
        }
    }
}

/// Configuration for loading product and search pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Which loader to use (default: chrome)
    pub kind: LoaderKind,

    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Page load timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Wait after a product page loads, in milliseconds (default: 5000)
    pub product_settle_ms: u64,

    /// Wait after a search page loads, in milliseconds (default: 8000)
    pub search_settle_ms: u64,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            kind: LoaderKind::Chrome,
            headless: true,
            timeout_secs: 30,
            product_settle_ms: 5000,
            search_settle_ms: 8000,
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl LoaderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn product_settle(&self) -> Duration {
        Duration::from_millis(self.product_settle_ms)
    }

    pub fn search_settle(&self) -> Duration {
        Duration::from_millis(self.search_settle_ms)
    }
}
