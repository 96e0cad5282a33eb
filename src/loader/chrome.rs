use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::app::{PriceWatchError, Result};
use crate::loader::{LoaderConfig, PageLoader};

/// A launched browser and whether its event handler is still running.
struct Session {
    browser: Browser,
    alive: Arc<AtomicBool>,
}

impl Session {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// Poll the browser's event stream in the background. The returned flag
/// turns false once the stream ends, which happens when Chrome exits.
fn drive_handler<S>(mut handler: S) -> Arc<AtomicBool>
where
    S: Stream + Send + Unpin + 'static,
    S::Item: Send,
{
    let alive = Arc::new(AtomicBool::new(true));
    let handler_alive = alive.clone();
    tokio::spawn(async move {
        while let Some(_event) = handler.next().await {}
        handler_alive.store(false, Ordering::Release);
        debug!("Browser handler stopped");
    });
    alive
}

/// Chrome-based page loader using chromiumoxide.
///
/// The browser is launched on first use, so commands that never load a page
/// do not pay for it. A browser that exits or stops accepting new pages is
/// relaunched on the next load.
pub struct ChromeLoader {
    session: Mutex<Option<Session>>,
    config: LoaderConfig,
}

impl ChromeLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            session: Mutex::new(None),
            config,
        }
    }

    async fn launch(&self) -> Result<Session> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !self.config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder.build().map_err(|e| {
            PriceWatchError::Browser(format!("Failed to build browser config: {}", e))
        })?;

        let (browser, handler) = Browser::launch(browser_config).await.map_err(|e| {
            PriceWatchError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let alive = drive_handler(handler);

        debug!("Browser launched");
        Ok(Session { browser, alive })
    }

    /// Open a blank tab, relaunching the browser if it has gone away.
    async fn open_page(&self) -> Result<Page> {
        let mut session = self.session.lock().await;

        if session.as_ref().is_some_and(|s| !s.is_alive()) {
            warn!("Browser exited, relaunching");
            *session = None;
        }

        let current = match session.take() {
            Some(current) => current,
            None => self.launch().await?,
        };

        match current.browser.new_page("about:blank").await {
            Ok(page) => {
                *session = Some(current);
                Ok(page)
            }
            // The session is dropped so the next load starts a fresh browser
            Err(e) => Err(PriceWatchError::Browser(format!(
                "Failed to create page: {}",
                e
            ))),
        }
    }

    async fn render(&self, page: &Page, url: &str, settle: Duration) -> Result<String> {
        if let Some(ref ua) = self.config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| PriceWatchError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        page.goto(url)
            .await
            .map_err(|e| PriceWatchError::Browser(format!("Navigation failed: {}", e)))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| PriceWatchError::Browser(format!("Navigation failed: {}", e)))?;

        // Client-side rendering finishes after the load event
        tokio::time::sleep(settle).await;

        page.content()
            .await
            .map_err(|e| PriceWatchError::Browser(format!("Failed to read page content: {}", e)))
    }
}

#[async_trait]
impl PageLoader for ChromeLoader {
    async fn load(&self, url: &str, settle: Duration) -> Result<String> {
        let page = self.open_page().await?;

        // Settle delay plus the page timeout bounds the whole render
        let budget = self.config.timeout() + settle;
        let result = tokio::time::timeout(budget, self.render(&page, url, settle))
            .await
            .unwrap_or_else(|_| {
                Err(PriceWatchError::Browser(format!(
                    "Timed out after {}s loading {}",
                    self.config.timeout_secs, url
                )))
            });

        // The tab is closed on success and failure alike
        match tokio::time::timeout(self.config.timeout(), page.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to close page for {}: {}", url, e),
            Err(_) => warn!("Timed out closing page for {}", url),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_browser_until_first_load() {
        let loader = ChromeLoader::new(LoaderConfig::default());
        assert!(loader.session.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_handler_flag_drops_when_events_end() {
        let alive = drive_handler(futures::stream::iter(vec![(), (), ()]));

        for _ in 0..100 {
            if !alive.load(Ordering::Acquire) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("handler flag still set after the event stream ended");
    }

    #[tokio::test]
    async fn test_handler_flag_stays_while_events_flow() {
        let alive = drive_handler(futures::stream::pending::<()>());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(alive.load(Ordering::Acquire));
    }
}
