//! Page loading for product and search pages.
//!
//! A loader opens a URL, waits for the page to settle, and returns its
//! rendered HTML. Extraction happens afterwards on the returned markup.
//!
//! ```rust,ignore
//! use pricewatch::loader::{build_loader, LoaderConfig};
//!
//! let loader = build_loader(&LoaderConfig::default())?;
//! let html = loader.load(url, config.product_settle()).await?;
//! ```

mod chrome;
mod config;
mod http;

pub use chrome::ChromeLoader;
pub use config::{LoaderConfig, LoaderKind};
pub use http::HttpLoader;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;

/// Trait for page loading implementations
#[async_trait]
pub trait PageLoader: Send + Sync {
    /// Load `url`, wait `settle` for client-side rendering, and return the HTML.
    async fn load(&self, url: &str, settle: Duration) -> Result<String>;
}

/// Create the loader selected by `config.kind`.
pub fn build_loader(config: &LoaderConfig) -> Result<Arc<dyn PageLoader>> {
    let loader: Arc<dyn PageLoader> = match config.kind {
        LoaderKind::Chrome => Arc::new(ChromeLoader::new(config.clone())),
        LoaderKind::Http => Arc::new(HttpLoader::new(config)?),
    };
    Ok(loader)
}
