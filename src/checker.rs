//! Periodic re-check of every tracked product.
//!
//! Runs in the foreground until SIGINT/SIGTERM, revisiting tracked URLs one
//! at a time on a fixed interval (6 hours by default).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use scraper::Html;
use serde::Deserialize;
use tokio::time::interval;
use tracing::{info, warn};

use crate::app::{PriceWatchError, Result};
use crate::domain::now_millis;
use crate::extract::extract_product_info;
use crate::history::{HistoryStore, RecordOutcome};
use crate::loader::PageLoader;
use crate::store::Repository;

/// Checker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Interval between passes, e.g. "6h", "30m", "1d" (default: "6h")
    pub interval: String,
    /// Whether to run a pass immediately on start
    pub check_on_start: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            interval: "6h".to_string(),
            check_on_start: true,
        }
    }
}

impl CheckerConfig {
    pub fn interval_secs(&self) -> Result<u64> {
        parse_interval(&self.interval).map_err(PriceWatchError::Config)
    }
}

/// Parse interval string like "1h", "30m", "6h", "1d"
pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    let secs = if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map(|h| h * 3600)
            .map_err(|_| format!("Invalid hours: {}", hours))?
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map(|m| m * 60)
            .map_err(|_| format!("Invalid minutes: {}", minutes))?
    } else if let Some(days) = s.strip_suffix('d') {
        days.parse::<u64>()
            .map(|d| d * 86400)
            .map_err(|_| format!("Invalid days: {}", days))?
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))?
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '6h', '30m', '1d'", s))?
    };

    if secs == 0 {
        return Err("Interval must be greater than zero".to_string());
    }
    Ok(secs)
}

/// Format interval for display
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Totals for one pass over the tracked products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
    pub alerts: usize,
}

pub struct PriceChecker<R> {
    history: Arc<HistoryStore<R>>,
    loader: Arc<dyn PageLoader>,
    settle: Duration,
}

impl<R: Repository> PriceChecker<R> {
    pub fn new(history: Arc<HistoryStore<R>>, loader: Arc<dyn PageLoader>, settle: Duration) -> Self {
        Self {
            history,
            loader,
            settle,
        }
    }

    /// Reload one product page and record its price.
    pub async fn check_url(&self, url: &str) -> Result<RecordOutcome> {
        let html = self.loader.load(url, self.settle).await?;
        let info = {
            let document = Html::parse_document(&html);
            extract_product_info(&document)
        };

        let price = info
            .price
            .ok_or_else(|| PriceWatchError::Other(format!("No price found on {}", url)))?;
        let name = info.name.unwrap_or_default();

        self.history.record_price(url, price, &name, now_millis())
    }

    /// Check every tracked URL, one at a time. A failing URL is logged and
    /// skipped; it never stops the pass.
    pub async fn check_all(&self) -> CheckSummary {
        let start = Utc::now();
        let mut summary = CheckSummary::default();

        let urls = match self.history.tracked_urls() {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Failed to list tracked products: {}", e);
                return summary;
            }
        };

        if urls.is_empty() {
            info!("No tracked products to check");
            return summary;
        }

        for url in urls {
            summary.checked += 1;
            match self.check_url(&url).await {
                Ok(RecordOutcome::Recorded { product, signals }) => {
                    summary.updated += 1;
                    summary.alerts += signals.len();
                    info!("  {} now {}", product.name, product.current_price);
                }
                // Untracked between listing and checking
                Ok(RecordOutcome::Untracked) => {}
                Err(e) => {
                    summary.failed += 1;
                    warn!("  Error checking {}: {}", url, e);
                }
            }
        }

        let elapsed = Utc::now().signed_duration_since(start);
        info!(
            "Check complete: {} updated, {} errors, {} alerts ({:.1}s)",
            summary.updated,
            summary.failed,
            summary.alerts,
            elapsed.num_milliseconds() as f64 / 1000.0
        );

        summary
    }

    /// Check on a fixed interval until interrupted.
    pub async fn run(&self, config: &CheckerConfig) -> Result<()> {
        let period = config.interval_secs()?;

        info!(
            "Price checker started (interval: {}, PID: {})",
            format_interval(period),
            std::process::id()
        );

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        if config.check_on_start {
            info!("Running initial check...");
            self.check_all().await;
        }

        let mut timer = interval(Duration::from_secs(period));
        timer.tick().await; // Skip the first immediate tick

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    result?;
                    break;
                }
                _ = timer.tick() => {
                    info!("Running scheduled check...");
                    self.check_all().await;
                }
            }
        }

        info!("Price checker shutting down...");
        Ok(())
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

#[cfg(windows)]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::alert::LogNotifier;
    use crate::store::MemoryStore;

    struct FakeLoader {
        pages: HashMap<String, String>,
        visited: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageLoader for FakeLoader {
        async fn load(&self, url: &str, _settle: Duration) -> Result<String> {
            self.visited.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| PriceWatchError::Browser(format!("Timed out loading {}", url)))
        }
    }

    const OK_URL: &str = "https://www.daraz.com.bd/products/a-i1.html";
    const DEAD_URL: &str = "https://www.daraz.com.bd/products/b-i2.html";
    const BLANK_URL: &str = "https://www.daraz.com.bd/products/c-i3.html";

    fn checker() -> (PriceChecker<MemoryStore>, Arc<HistoryStore<MemoryStore>>, Arc<FakeLoader>) {
        let history = Arc::new(HistoryStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
        ));
        for url in [OK_URL, DEAD_URL, BLANK_URL] {
            history.toggle_tracking(url, "Product", 1000.0).unwrap();
        }

        let mut pages = HashMap::new();
        pages.insert(
            OK_URL.to_string(),
            r#"<html><body><h1 class="pdp-mod-product-badge-title">A</h1>
               <span class="pdp-price">৳ 850</span></body></html>"#
                .to_string(),
        );
        pages.insert(
            BLANK_URL.to_string(),
            "<html><head></head><body></body></html>".to_string(),
        );

        let loader = Arc::new(FakeLoader {
            pages,
            visited: Mutex::new(Vec::new()),
        });
        let checker = PriceChecker::new(history.clone(), loader.clone(), Duration::ZERO);
        (checker, history, loader)
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("1h").unwrap(), 3600);
        assert_eq!(parse_interval("30m").unwrap(), 1800);
        assert_eq!(parse_interval("1d").unwrap(), 86400);
        assert_eq!(parse_interval("60s").unwrap(), 60);
        assert_eq!(parse_interval("21600").unwrap(), 21600);
        assert_eq!(parse_interval("6h").unwrap(), 360 * 60);
        assert!(parse_interval("invalid").is_err());
        assert!(parse_interval("0h").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(21600), "6h");
        assert_eq!(format_interval(1800), "30m");
        assert_eq!(format_interval(86400), "1d");
        assert_eq!(format_interval(90), "90s");
    }

    #[test]
    fn test_default_config_interval() {
        assert_eq!(CheckerConfig::default().interval_secs().unwrap(), 21600);
    }

    #[tokio::test]
    async fn test_check_all_isolates_failures() {
        let (checker, history, loader) = checker();

        let summary = checker.check_all().await;

        assert_eq!(
            summary,
            CheckSummary {
                checked: 3,
                updated: 1,
                failed: 2,
                alerts: 0,
            }
        );
        // Every URL was attempted despite the failures before it
        assert_eq!(loader.visited.lock().unwrap().len(), 3);

        let product = history.get_product(OK_URL).unwrap().unwrap();
        assert_eq!(product.current_price, 850.0);
        assert_eq!(product.lowest_price, 850.0);
        assert_eq!(product.price_history.len(), 2);

        let untouched = history.get_product(BLANK_URL).unwrap().unwrap();
        assert_eq!(untouched.price_history.len(), 1);
    }

    #[tokio::test]
    async fn test_check_all_counts_alerts() {
        let (checker, history, _) = checker();
        history
            .set_alert(OK_URL, crate::domain::AlertKind::Below, Some(900.0))
            .unwrap();

        let summary = checker.check_all().await;
        assert_eq!(summary.alerts, 1);
    }

    #[tokio::test]
    async fn test_check_all_with_nothing_tracked() {
        let history = Arc::new(HistoryStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
        ));
        let loader = Arc::new(FakeLoader {
            pages: HashMap::new(),
            visited: Mutex::new(Vec::new()),
        });
        let checker = PriceChecker::new(history, loader, Duration::ZERO);

        assert_eq!(checker.check_all().await, CheckSummary::default());
    }
}
