use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Price points older than this many days are dropped on every update.
pub const HISTORY_RETENTION_DAYS: i64 = 90;

/// Current wall-clock time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl PricePoint {
    pub fn new(price: f64, timestamp: i64) -> Self {
        Self { price, timestamp }
    }

    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Below,
    Above,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Below => "below",
            AlertKind::Above => "above",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "below" => Ok(AlertKind::Below),
            "above" => Ok(AlertKind::Above),
            other => Err(format!("Unknown alert kind: {}. Use 'below' or 'above'", other)),
        }
    }
}

/// Alert thresholds for a tracked product. A `None` entry means no alert of that kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceAlerts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub below: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<f64>,
}

impl PriceAlerts {
    pub fn get(&self, kind: AlertKind) -> Option<f64> {
        match kind {
            AlertKind::Below => self.below,
            AlertKind::Above => self.above,
        }
    }

    /// Set or clear a threshold. Zero, negative and non-finite thresholds clear it.
    pub fn set(&mut self, kind: AlertKind, threshold: Option<f64>) {
        let threshold = threshold.filter(|t| t.is_finite() && *t > 0.0);
        match kind {
            AlertKind::Below => self.below = threshold,
            AlertKind::Above => self.above = threshold,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.below.is_none() && self.above.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedProduct {
    pub name: String,
    pub current_price: f64,
    /// Chronological, never empty once created
    pub price_history: Vec<PricePoint>,
    pub lowest_price: f64,
    pub highest_price: f64,
    pub last_checked: i64,
    #[serde(default, skip_serializing_if = "PriceAlerts::is_empty")]
    pub price_alerts: PriceAlerts,
}

impl TrackedProduct {
    /// Start tracking with a single history entry at `price`.
    pub fn seed(name: impl Into<String>, price: f64, now: i64) -> Self {
        Self {
            name: name.into(),
            current_price: price,
            price_history: vec![PricePoint::new(price, now)],
            lowest_price: price,
            highest_price: price,
            last_checked: now,
            price_alerts: PriceAlerts::default(),
        }
    }

    /// Append an observation, prune the retention window relative to
    /// `timestamp` and refresh the derived bounds.
    pub fn record(&mut self, price: f64, timestamp: i64) {
        self.price_history.push(PricePoint::new(price, timestamp));
        self.current_price = price;
        self.last_checked = timestamp;
        self.prune(timestamp);
        self.recompute_bounds();
    }

    fn prune(&mut self, now: i64) {
        let cutoff = now - HISTORY_RETENTION_DAYS * DAY_MS;
        self.price_history.retain(|p| p.timestamp >= cutoff);
    }

    fn recompute_bounds(&mut self) {
        let mut prices = self.price_history.iter().map(|p| p.price);
        if let Some(first) = prices.next() {
            let (low, high) = prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
            self.lowest_price = low;
            self.highest_price = high;
        }
    }

    /// History entries observed within the last `window_days` of `now`.
    ///
    /// The iterator borrows the history and can be cloned to restart it.
    pub fn history_within(
        &self,
        window_days: i64,
        now: i64,
    ) -> impl Iterator<Item = &PricePoint> + Clone + '_ {
        let cutoff = now - window_days * DAY_MS;
        self.price_history.iter().filter(move |p| p.timestamp >= cutoff)
    }

    /// Percent change from the oldest retained price to the latest.
    pub fn price_change_percent(&self) -> f64 {
        match (self.price_history.first(), self.price_history.last()) {
            (Some(first), Some(last)) if self.price_history.len() >= 2 && first.price != 0.0 => {
                (last.price - first.price) / first.price * 100.0
            }
            _ => 0.0,
        }
    }

    pub fn tracking_days(&self, now: i64) -> Option<i64> {
        self.price_history
            .first()
            .map(|first| (now - first.timestamp).max(0) / DAY_MS)
    }

    pub fn tracking_duration_label(&self, now: i64) -> String {
        match self.tracking_days(now) {
            None => "Just started".to_string(),
            Some(0) => "Today".to_string(),
            Some(1) => "1 day".to_string(),
            Some(days) => format!("{} days", days),
        }
    }
}

/// Compact relative time, e.g. `5m ago`.
pub fn format_time_ago(then: i64, now: i64) -> String {
    let seconds = (now - then).max(0) / 1000;
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}
