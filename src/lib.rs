//! # pricewatch
//!
//! Tracks product prices on Daraz, keeps a rolling 90-day price history and
//! alerts when a price crosses a user-set threshold.
//!
//! ## Architecture
//!
//! ```text
//! PageLoader → Extract → HistoryStore → Repository
//!                              ↓
//!                         Alert → Notifier
//! ```
//!
//! - [`loader`]: headless Chrome or plain HTTP page loading
//! - [`extract`]: price and search-result extraction from rendered HTML
//! - [`history`]: tracking lifecycle and price history
//! - [`store`]: SQLite persistence behind the [`Repository`](store::Repository) trait
//! - [`checker`]: periodic re-check of every tracked product
//!
//! ## Quick Start
//!
//! ```bash
//! # Find something cheap
//! pricewatch search "electric kettle"
//!
//! # Start tracking a product
//! pricewatch track https://www.daraz.com.bd/products/...
//!
//! # Alert when it drops below 1000
//! pricewatch alert https://www.daraz.com.bd/products/... --below 1000
//!
//! # Re-check every 6 hours
//! pricewatch watch
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// loader, service and checker.
pub mod app;

/// Alert evaluation and notification.
pub mod alert;

/// Periodic price checker.
///
/// - `pricewatch check` runs one pass
/// - `pricewatch watch` repeats on an interval until interrupted
pub mod checker;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/pricewatch/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`TrackedProduct`](domain::TrackedProduct): a watched URL with its history
/// - [`PricePoint`](domain::PricePoint): one observed price
/// - [`ScrapedProduct`](domain::ScrapedProduct): a search result
pub mod domain;

pub mod extract;

/// Price history and tracking lifecycle.
pub mod history;

pub mod loader;

/// JSON request handling (`pricewatch rpc`).
pub mod service;

/// SQLite persistence layer.
///
/// - [`Repository`](store::Repository): keyed product storage
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
/// - [`MemoryStore`](store::MemoryStore): in-process implementation
pub mod store;
