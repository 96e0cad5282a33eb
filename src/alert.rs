use tracing::info;

use crate::app::{PriceWatchError, Result};
use crate::domain::{AlertKind, TrackedProduct};

pub const NOTIFICATION_PREFIX: &str = "price-alert-";

/// A threshold crossed by the latest price.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSignal {
    pub kind: AlertKind,
    pub url: String,
    pub name: String,
    pub price: f64,
    pub threshold: f64,
}

impl AlertSignal {
    pub fn notification_id(&self) -> String {
        notification_id(&self.url)
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            AlertKind::Below => "Price Drop Alert!",
            AlertKind::Above => "Price Increase Alert!",
        }
    }

    pub fn message(&self) -> String {
        match self.kind {
            AlertKind::Below => format!(
                "{} price has dropped to {}! (Below your target of {})",
                self.name, self.price, self.threshold
            ),
            AlertKind::Above => format!(
                "{} price has increased to {}! (Above your target of {})",
                self.name, self.price, self.threshold
            ),
        }
    }
}

/// Check the current price against both thresholds independently.
///
/// Both kinds can fire on the same update, and nothing suppresses a signal
/// that already fired on an earlier check.
pub fn evaluate(url: &str, product: &TrackedProduct) -> Vec<AlertSignal> {
    let alerts = &product.price_alerts;
    let current = product.current_price;

    let crossed = [
        alerts.below.filter(|below| current <= *below).map(|t| (AlertKind::Below, t)),
        alerts.above.filter(|above| current >= *above).map(|t| (AlertKind::Above, t)),
    ];

    crossed
        .into_iter()
        .flatten()
        .map(|(kind, threshold)| AlertSignal {
            kind,
            url: url.to_string(),
            name: product.name.clone(),
            price: current,
            threshold,
        })
        .collect()
}

pub fn notification_id(url: &str) -> String {
    format!("{}{}", NOTIFICATION_PREFIX, url)
}

/// Product URL behind a notification id.
pub fn notification_target(id: &str) -> Option<&str> {
    id.strip_prefix(NOTIFICATION_PREFIX).filter(|url| !url.is_empty())
}

/// Open the product behind a notification in the system browser.
pub fn open_notification(id: &str) -> Result<()> {
    let url = notification_target(id)
        .ok_or_else(|| PriceWatchError::Other(format!("Not a price alert: {}", id)))?;
    open::that(url)?;
    Ok(())
}

/// Surfaces alert signals to the user.
pub trait Notifier {
    fn notify(&self, signal: &AlertSignal);
}

/// Writes alerts to the log. Stdout stays free for command output and the
/// `rpc` response stream.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, signal: &AlertSignal) {
        info!(
            id = %signal.notification_id(),
            "{}: {}",
            signal.title(),
            signal.message()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceAlerts;

    const URL: &str = "https://www.daraz.com.bd/products/kettle-i1.html";

    fn product(current: f64, alerts: PriceAlerts) -> TrackedProduct {
        let mut product = TrackedProduct::seed("Kettle", current, 0);
        product.price_alerts = alerts;
        product
    }

    #[test]
    fn test_below_fires() {
        let signals = evaluate(
            URL,
            &product(
                500.0,
                PriceAlerts {
                    below: Some(600.0),
                    above: None,
                },
            ),
        );
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, AlertKind::Below);
        assert_eq!(signals[0].threshold, 600.0);
        assert_eq!(signals[0].title(), "Price Drop Alert!");
    }

    #[test]
    fn test_both_fire_on_same_update() {
        let signals = evaluate(
            URL,
            &product(
                500.0,
                PriceAlerts {
                    below: Some(600.0),
                    above: Some(400.0),
                },
            ),
        );
        let kinds: Vec<_> = signals.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![AlertKind::Below, AlertKind::Above]);
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let signals = evaluate(
            URL,
            &product(
                500.0,
                PriceAlerts {
                    below: Some(500.0),
                    above: Some(500.0),
                },
            ),
        );
        assert_eq!(signals.len(), 2);
    }

    #[test]
    fn test_nothing_fires_inside_band() {
        let signals = evaluate(
            URL,
            &product(
                500.0,
                PriceAlerts {
                    below: Some(450.0),
                    above: Some(550.0),
                },
            ),
        );
        assert!(signals.is_empty());
        assert!(evaluate(URL, &product(500.0, PriceAlerts::default())).is_empty());
    }

    #[test]
    fn test_message_text() {
        let signal = AlertSignal {
            kind: AlertKind::Above,
            url: URL.to_string(),
            name: "Kettle".to_string(),
            price: 1200.0,
            threshold: 1100.0,
        };
        assert_eq!(
            signal.message(),
            "Kettle price has increased to 1200! (Above your target of 1100)"
        );
        assert_eq!(signal.notification_id(), format!("price-alert-{}", URL));
    }

    #[test]
    fn test_notification_target() {
        let id = notification_id(URL);
        assert_eq!(notification_target(&id), Some(URL));
        assert_eq!(notification_target("price-alert-"), None);
        assert_eq!(notification_target("other-id"), None);
    }
}
