//! Price and product-name extraction from a single product page.

use scraper::{ElementRef, Html};
use tracing::trace;

use crate::extract::selectors::{self, CURRENCY_GLYPH};

/// A price lookup over a document or fragment. Strategies are tried in order
/// and the first one that yields a price wins.
pub type PriceStrategy = fn(ElementRef<'_>) -> Option<f64>;

pub const PRICE_STRATEGIES: &[(&str, PriceStrategy)] = &[
    ("ranked-selectors", by_ranked_selectors),
    ("text-scan", by_text_scan),
];

/// Name and price read from a product page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInfo {
    pub name: Option<String>,
    pub price: Option<f64>,
}

/// Concatenated text content of an element and its descendants.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Text of the element's direct text children only.
pub fn own_text(element: ElementRef<'_>) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect()
}

/// Text with the currency glyph removed and surrounding whitespace trimmed.
pub fn strip_glyph(text: &str) -> String {
    text.replace(CURRENCY_GLYPH, "").trim().to_string()
}

/// Keep digits and dots. Commas are thousands separators on this site.
pub fn normalize_price_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Parse the longest leading `digits[.digits]` run, ignoring the rest.
///
/// `"1.234.56"` parses as `1.234`: text that uses dots for both grouping and
/// decimals is misread rather than rejected.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }
    text[..end].trim_end_matches('.').parse::<f64>().ok()
}

/// Turn displayed price text such as `৳ 1,299.50` into a number.
///
/// Returns `None` for empty text, text without digits, and any value that is
/// not a positive finite number.
pub fn parse_price_text(text: &str) -> Option<f64> {
    let stripped = strip_glyph(text);
    if stripped.is_empty() {
        return None;
    }
    let normalized = normalize_price_text(&stripped);
    if normalized.is_empty() {
        return None;
    }
    parse_leading_number(&normalized).filter(|price| price.is_finite() && *price > 0.0)
}

/// Like [`parse_price_text`], but only for text that reads as a price: it
/// either carries the currency glyph or consists of nothing but digits and
/// separators.
pub fn price_like(text: &str) -> Option<f64> {
    let has_glyph = text.contains(CURRENCY_GLYPH);
    let bare = strip_glyph(text);
    let numeric_only = !bare.is_empty()
        && bare
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c == '.' || c.is_whitespace());

    if has_glyph || numeric_only {
        parse_price_text(text)
    } else {
        None
    }
}

/// First element (per selector) of the ranked product-page price selectors.
fn by_ranked_selectors(scope: ElementRef<'_>) -> Option<f64> {
    selectors::product::PRICE.iter().find_map(|selector| {
        let element = scope.select(selector).next()?;
        parse_price_text(&element_text(element))
    })
}

/// Last resort: every element in document order, the scope itself first.
fn by_text_scan(scope: ElementRef<'_>) -> Option<f64> {
    std::iter::once(scope)
        .chain(scope.select(&selectors::ANY))
        .find_map(|element| parse_price_text(&element_text(element)))
}

/// Extract the product price from a full page.
pub fn extract_price(document: &Html) -> Option<f64> {
    extract_price_in(document.root_element())
}

/// Extract a price from a fragment, such as a single product card.
pub fn extract_price_in(scope: ElementRef<'_>) -> Option<f64> {
    PRICE_STRATEGIES.iter().find_map(|(name, strategy)| {
        let price = strategy(scope)?;
        trace!("Price {} found by {} strategy", price, name);
        Some(price)
    })
}

/// Product name and price from a product page.
pub fn extract_product_info(document: &Html) -> ProductInfo {
    let name = [&*selectors::product::TITLE, &*selectors::product::DOCUMENT_TITLE]
        .into_iter()
        .filter_map(|selector| document.select(selector).next())
        .map(|element| element_text(element).trim().to_string())
        .find(|name| !name.is_empty());

    ProductInfo {
        name,
        price: extract_price(document),
    }
}
