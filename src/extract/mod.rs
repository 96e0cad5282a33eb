//! Price and product extraction from rendered Daraz pages.
//!
//! Everything here is synchronous and works on a parsed [`scraper::Html`]
//! document, so it can be tested against static fixtures. Page loading lives
//! in [`crate::loader`].
//!
//! # Architecture
//!
//! ```text
//! PageLoader → HTML → Html::parse_document → extract_price / scrape_listing
//! ```
//!
//! Both extractors are ordered lists of strategies tried first to last:
//!
//! - [`price::PRICE_STRATEGIES`]: ranked price selectors, then a text scan
//!   of every element.
//! - [`listing::LISTING_STRATEGIES`]: modern cards, classic cards, generic
//!   product links, currency-symbol scan.

pub mod listing;
pub mod price;
pub mod selectors;

pub use listing::{rank_products, scrape_listing, ListingScrape, ScrapeDiagnostics};
pub use price::{extract_price, extract_price_in, extract_product_info, parse_price_text, ProductInfo};
pub use selectors::CURRENCY_GLYPH;
