//! Price history for tracked products.
//!
//! [`HistoryStore`] is the only writer of [`TrackedProduct`] records. It
//! owns the tracking lifecycle (a strict on/off toggle), appends price
//! observations, keeps the 90-day window and derived bounds up to date, and
//! hands every update to the alert evaluator.

use std::sync::Arc;

use tracing::{debug, info};

use crate::alert::{self, AlertSignal, Notifier};
use crate::app::{PriceWatchError, Result};
use crate::domain::{now_millis, AlertKind, PriceAlerts, PricePoint, TrackedProduct};
use crate::store::Repository;

/// Result of [`HistoryStore::record_price`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The URL is not tracked; nothing was stored.
    Untracked,
    /// The price was appended. `signals` lists the alerts that fired.
    Recorded {
        product: TrackedProduct,
        signals: Vec<AlertSignal>,
    },
}

pub struct HistoryStore<R> {
    repo: Arc<R>,
    notifier: Arc<dyn Notifier + Send + Sync>,
}

fn valid_price(price: f64) -> Result<f64> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(PriceWatchError::InvalidPrice(price))
    }
}

impl<R: Repository> HistoryStore<R> {
    pub fn new(repo: Arc<R>, notifier: Arc<dyn Notifier + Send + Sync>) -> Self {
        Self { repo, notifier }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub fn get_product(&self, url: &str) -> Result<Option<TrackedProduct>> {
        self.repo.get(url)
    }

    pub fn tracked_urls(&self) -> Result<Vec<String>> {
        self.repo.urls()
    }

    pub fn tracked_products(&self) -> Result<Vec<(String, TrackedProduct)>> {
        self.repo.all()
    }

    /// Append an observed price to a tracked product.
    ///
    /// Untracked URLs are ignored. The stored name is kept; `name` only fills
    /// it in when the record has none.
    pub fn record_price(
        &self,
        url: &str,
        price: f64,
        name: &str,
        timestamp: i64,
    ) -> Result<RecordOutcome> {
        let Some(mut product) = self.repo.get(url)? else {
            debug!("Ignoring price for untracked {}", url);
            return Ok(RecordOutcome::Untracked);
        };
        let price = valid_price(price)?;

        product.record(price, timestamp);
        if product.name.trim().is_empty() {
            product.name = name.trim().to_string();
        }
        self.repo.put(url, &product)?;

        let signals = alert::evaluate(url, &product);
        for signal in &signals {
            self.notifier.notify(signal);
        }

        debug!(
            "Recorded {} for {} ({} points, low {}, high {})",
            price,
            url,
            product.price_history.len(),
            product.lowest_price,
            product.highest_price
        );

        Ok(RecordOutcome::Recorded { product, signals })
    }

    /// Start tracking an untracked URL or stop tracking a tracked one.
    ///
    /// Returns whether the URL is tracked afterwards.
    pub fn toggle_tracking(&self, url: &str, name: &str, price: f64) -> Result<bool> {
        self.toggle_tracking_at(url, name, price, now_millis())
    }

    pub fn toggle_tracking_at(&self, url: &str, name: &str, price: f64, now: i64) -> Result<bool> {
        if self.repo.get(url)?.is_some() {
            self.repo.delete(url)?;
            info!("Stopped tracking {}", url);
            return Ok(false);
        }

        let price = valid_price(price)?;
        let product = TrackedProduct::seed(name.trim(), price, now);
        self.repo.put(url, &product)?;
        info!("Started tracking {} at {}", url, price);
        Ok(true)
    }

    /// Set or clear an alert threshold. `None` (or a zero threshold) clears it.
    pub fn set_alert(
        &self,
        url: &str,
        kind: AlertKind,
        threshold: Option<f64>,
    ) -> Result<PriceAlerts> {
        let mut product = self
            .repo
            .get(url)?
            .ok_or_else(|| PriceWatchError::ProductNotFound(url.to_string()))?;

        product.price_alerts.set(kind, threshold);
        self.repo.put(url, &product)?;
        Ok(product.price_alerts)
    }

    /// History entries of a tracked product from the last `window_days`.
    pub fn filter_history(&self, url: &str, window_days: i64) -> Result<Vec<PricePoint>> {
        self.filter_history_at(url, window_days, now_millis())
    }

    pub fn filter_history_at(
        &self,
        url: &str,
        window_days: i64,
        now: i64,
    ) -> Result<Vec<PricePoint>> {
        let product = self
            .repo
            .get(url)?
            .ok_or_else(|| PriceWatchError::ProductNotFound(url.to_string()))?;
        Ok(product.history_within(window_days, now).copied().collect())
    }
}
