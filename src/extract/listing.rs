//! Search-results scraping.
//!
//! [`LISTING_STRATEGIES`] are tried in order and the first one that yields
//! products wins. Results are sorted by price and deduplicated by URL.

use std::collections::HashSet;
use std::fmt;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::app::Result;
use crate::domain::ScrapedProduct;
use crate::extract::price::{element_text, own_text, parse_price_text, price_like, strip_glyph};
use crate::extract::selectors::{self, classic, modern, CURRENCY_GLYPH};

/// How many ancestor levels the currency scan climbs looking for a product link.
const MAX_ANCESTOR_LEVELS: usize = 5;

/// One way of reading product cards off a search-results page.
pub struct ListingStrategy {
    pub name: &'static str,
    run: fn(&Html, Option<&Url>, &mut ScrapeDiagnostics) -> Vec<ScrapedProduct>,
}

/// Strategies in fallback order. Results are never merged across strategies.
pub const LISTING_STRATEGIES: &[ListingStrategy] = &[
    ListingStrategy {
        name: "modern",
        run: modern_cards,
    },
    ListingStrategy {
        name: "classic",
        run: classic_cards,
    },
    ListingStrategy {
        name: "generic",
        run: generic_links,
    },
    ListingStrategy {
        name: "currency",
        run: currency_scan,
    },
];

#[derive(Debug, Clone)]
pub struct StructureCount {
    pub label: &'static str,
    pub count: usize,
}

/// What the scraper saw, for diagnosing selector drift.
#[derive(Debug, Clone, Default)]
pub struct ScrapeDiagnostics {
    pub structure: Vec<StructureCount>,
    pub trail: Vec<String>,
    pub matched_strategy: Option<&'static str>,
    pub unique_products: usize,
}

impl ScrapeDiagnostics {
    /// Count the structural probes on a page.
    pub fn survey(document: &Html) -> Self {
        let structure = selectors::STRUCTURE
            .iter()
            .map(|(label, selector)| StructureCount {
                label: *label,
                count: document.select(selector).count(),
            })
            .collect();

        Self {
            structure,
            ..Default::default()
        }
    }

    pub fn note(&mut self, entry: impl Into<String>) {
        self.trail.push(entry.into());
    }

    /// Record a card that could not be read; the card is skipped.
    pub fn card_error(&mut self, strategy: &str, error: impl fmt::Display) {
        warn!("Skipping {} card: {}", strategy, error);
        self.trail
            .push(format!("Error parsing {} card: {}", strategy, error));
    }
}

impl fmt::Display for ScrapeDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let structure = self
            .structure
            .iter()
            .map(|s| format!("{}: {}", s.label, s.count))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", structure)?;

        for entry in &self.trail {
            write!(f, " | {}", entry)?;
        }
        write!(f, " | Final unique products: {}", self.unique_products)
    }
}

/// Products found on a search-results page, cheapest first.
#[derive(Debug, Clone)]
pub struct ListingScrape {
    pub products: Vec<ScrapedProduct>,
    pub diagnostics: ScrapeDiagnostics,
}

/// Scrape a search-results page.
///
/// `page_url` resolves relative product links; without it only absolute
/// hrefs are usable.
pub fn scrape_listing(document: &Html, page_url: Option<&Url>) -> ListingScrape {
    let mut diagnostics = ScrapeDiagnostics::survey(document);
    let mut products = Vec::new();

    for strategy in LISTING_STRATEGIES {
        products = (strategy.run)(document, page_url, &mut diagnostics);
        if !products.is_empty() {
            debug!(
                "Listing strategy {} found {} products",
                strategy.name,
                products.len()
            );
            diagnostics.matched_strategy = Some(strategy.name);
            break;
        }
    }

    let products = rank_products(products);
    diagnostics.unique_products = products.len();

    ListingScrape {
        products,
        diagnostics,
    }
}

/// Sort ascending by price, then keep the first (cheapest) entry per URL.
pub fn rank_products(mut products: Vec<ScrapedProduct>) -> Vec<ScrapedProduct> {
    products.sort_by(|a, b| a.price.total_cmp(&b.price));

    let mut seen = HashSet::new();
    products.retain(|product| seen.insert(product.url.clone()));
    products
}

fn resolve_href(href: &str, base: Option<&Url>) -> Result<String> {
    let url = match base {
        Some(base) => base.join(href)?,
        None => Url::parse(href)?,
    };
    Ok(url.to_string())
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element_text(element).trim().to_string()
}

fn first_non_empty_text(scope: ElementRef<'_>, ranked: &[Selector]) -> Option<String> {
    ranked.iter().find_map(|selector| {
        let element = scope.select(selector).next()?;
        Some(trimmed_text(element)).filter(|text| !text.is_empty())
    })
}

fn first_href<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<&'a str> {
    scope
        .select(selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
}

/// Title attribute if present and non-empty, otherwise the anchor text.
fn link_name(link: ElementRef<'_>) -> String {
    link.value()
        .attr("title")
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(String::from)
        .unwrap_or_else(|| trimmed_text(link))
}

fn build_product(
    name: String,
    price: Option<f64>,
    href: Option<&str>,
    base: Option<&Url>,
) -> Result<Option<ScrapedProduct>> {
    let (Some(price), Some(href)) = (price, href) else {
        return Ok(None);
    };
    if name.is_empty() || !price.is_finite() || price <= 0.0 {
        return Ok(None);
    }
    let url = resolve_href(href, base)?;
    Ok(Some(ScrapedProduct { name, price, url }))
}

/// First span in the scope whose text reads as a price.
fn price_like_span(scope: ElementRef<'_>) -> Option<f64> {
    scope
        .select(&selectors::SPAN)
        .find_map(|span| price_like(&element_text(span)))
}

fn modern_card(card: ElementRef<'_>, base: Option<&Url>) -> Result<Option<ScrapedProduct>> {
    let name = first_non_empty_text(card, &modern::NAME)
        .or_else(|| {
            card.select(&modern::TITLED_LINK)
                .filter_map(|a| a.value().attr("title"))
                .map(|title| title.trim().to_string())
                .find(|title| !title.is_empty())
        })
        .unwrap_or_default();

    let price = modern::PRICE
        .iter()
        .find_map(|selector| {
            let element = card.select(selector).next()?;
            parse_price_text(&element_text(element))
        })
        .or_else(|| {
            // First span with any text, price-like or not
            card.select(&selectors::SPAN)
                .find(|span| !strip_glyph(&element_text(*span)).is_empty())
                .and_then(|span| parse_price_text(&element_text(span)))
        });

    let href = first_href(card, &selectors::LINK);
    build_product(name, price, href, base)
}

fn modern_cards(
    document: &Html,
    base: Option<&Url>,
    diagnostics: &mut ScrapeDiagnostics,
) -> Vec<ScrapedProduct> {
    let cards: Vec<_> = document.select(&modern::CARD).collect();
    if cards.is_empty() {
        return Vec::new();
    }
    diagnostics.note(format!("Found modern cards: {}", cards.len()));

    let mut products = Vec::new();
    for card in cards {
        match modern_card(card, base) {
            Ok(Some(product)) => products.push(product),
            Ok(None) => {}
            Err(e) => diagnostics.card_error("modern", e),
        }
    }
    products
}

fn classic_card(card: ElementRef<'_>, base: Option<&Url>) -> Result<Option<ScrapedProduct>> {
    let name = first_non_empty_text(card, &classic::NAME).unwrap_or_default();
    let price = price_like_span(card);
    let href = first_href(card, &selectors::LINK);
    build_product(name, price, href, base)
}

fn classic_cards(
    document: &Html,
    base: Option<&Url>,
    diagnostics: &mut ScrapeDiagnostics,
) -> Vec<ScrapedProduct> {
    let cards: Vec<_> = document.select(&classic::CARD).collect();
    diagnostics.note(format!("Trying classic cards: {}", cards.len()));

    let mut products = Vec::new();
    for card in cards {
        match classic_card(card, base) {
            Ok(Some(product)) => products.push(product),
            Ok(None) => {}
            Err(e) => diagnostics.card_error("classic", e),
        }
    }
    products
}

fn inside_div(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "div")
}

fn generic_links(
    document: &Html,
    base: Option<&Url>,
    diagnostics: &mut ScrapeDiagnostics,
) -> Vec<ScrapedProduct> {
    let links: Vec<_> = document.select(&selectors::PRODUCT_LINK).collect();
    diagnostics.note(format!("Trying generic approach: {} product links", links.len()));

    // Page-wide, not scoped to the link: every product gets the same price
    let price = price_like_span(document.root_element());

    let mut products = Vec::new();
    for link in links.into_iter().filter(|link| inside_div(*link)) {
        let href = link.value().attr("href").map(str::trim);
        match build_product(link_name(link), price, href, base) {
            Ok(Some(product)) => products.push(product),
            Ok(None) => {}
            Err(e) => diagnostics.card_error("generic", e),
        }
    }
    products
}

fn currency_price(element: ElementRef<'_>) -> Option<f64> {
    price_like(&own_text(element)).or_else(|| price_like(&element_text(element)))
}

fn currency_scan(
    document: &Html,
    base: Option<&Url>,
    diagnostics: &mut ScrapeDiagnostics,
) -> Vec<ScrapedProduct> {
    diagnostics.note("Trying currency symbol approach");

    let priced: Vec<_> = document
        .select(&selectors::ANY)
        .filter(|element| own_text(*element).contains(CURRENCY_GLYPH))
        .collect();
    diagnostics.note(format!(
        "Found {} elements with currency symbol",
        priced.len()
    ));

    let mut products = Vec::new();
    for element in priced {
        let Some(price) = currency_price(element) else {
            continue;
        };

        let mut container = element;
        for _ in 0..MAX_ANCESTOR_LEVELS {
            let Some(parent) = container.parent().and_then(ElementRef::wrap) else {
                break;
            };
            container = parent;

            let Some(link) = container.select(&selectors::PRODUCT_LINK).next() else {
                continue;
            };
            let href = link.value().attr("href").map(str::trim);
            match build_product(link_name(link), Some(price), href, base) {
                Ok(Some(product)) => {
                    products.push(product);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    diagnostics.card_error("currency", e);
                    break;
                }
            }
        }
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.daraz.com.bd/catalog/?q=kettle").unwrap()
    }

    fn scrape(html: &str) -> ListingScrape {
        let document = Html::parse_document(html);
        scrape_listing(&document, Some(&base()))
    }

    #[test]
    fn test_modern_cards() {
        let result = scrape(
            r#"<div data-qa-locator="product-item">
                 <a href="//www.daraz.com.bd/products/kettle-a-i1.html">
                   <div class="title--wFj93">Kettle A</div></a>
                 <div class="price--NVB62"><span>৳ 1,450</span></div>
               </div>
               <div data-qa-locator="product-item">
                 <a href="/products/kettle-b-i2.html" title="Kettle B"></a>
                 <span class="currency--GVKjl">৳ 990</span>
               </div>"#,
        );

        assert_eq!(result.diagnostics.matched_strategy, Some("modern"));
        assert_eq!(result.products.len(), 2);
        assert_eq!(
            result.products[0],
            ScrapedProduct::new(
                "Kettle B",
                990.0,
                "https://www.daraz.com.bd/products/kettle-b-i2.html"
            )
        );
        assert_eq!(result.products[1].name, "Kettle A");
        assert_eq!(result.products[1].price, 1450.0);
        assert_eq!(
            result.products[1].url,
            "https://www.daraz.com.bd/products/kettle-a-i1.html"
        );
    }

    #[test]
    fn test_modern_card_requires_all_fields() {
        let result = scrape(
            r#"<div class="box--ujueT">
                 <div class="title--wFj93">No link</div>
                 <span class="price">৳ 100</span>
               </div>
               <div class="box--ujueT">
                 <a href="/item/no-price-i3.html" title="No price"></a>
                 <span class="price">Sold out</span>
               </div>"#,
        );
        assert!(result.products.is_empty());
        assert_eq!(result.diagnostics.matched_strategy, None);
    }

    #[test]
    fn test_modern_price_falls_back_to_first_text_span() {
        let result = scrape(
            r#"<div data-tracking="product-card">
                 <a href="/products/x-i9.html" title="Thing"></a>
                 <span>৳ 75</span>
               </div>"#,
        );
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].price, 75.0);
    }

    #[test]
    fn test_classic_cards_use_price_like_text() {
        let result = scrape(
            r#"<span>Header banner</span>
               <div class="gridItem">
                 <div class="c16H9d"><a href="/products/fan-i5.html">Table Fan</a></div>
                 <span>Free delivery</span>
                 <span>৳ 2,100</span>
               </div>"#,
        );

        assert_eq!(result.diagnostics.matched_strategy, Some("classic"));
        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].name, "Table Fan");
        assert_eq!(result.products[0].price, 2100.0);
    }

    #[test]
    fn test_generic_links_share_page_price() {
        let result = scrape(
            r#"<div>
                 <a href="/products/a-i1.html" title="Lamp">x</a>
                 <a href="/products/b-i2.html">Desk Lamp</a>
                 <span>৳ 650</span>
               </div>"#,
        );

        assert_eq!(result.diagnostics.matched_strategy, Some("generic"));
        assert_eq!(result.products.len(), 2);
        assert!(result.products.iter().all(|p| p.price == 650.0));
        let names: Vec<_> = result.products.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Lamp"));
        assert!(names.contains(&"Desk Lamp"));
    }

    #[test]
    fn test_currency_scan_walks_up_to_link() {
        let result = scrape(
            r#"<section>
                 <h3><a href="/products/iron-i7.html" title="Steam Iron">Iron</a></h3>
                 <p><b>৳ 1,800</b></p>
               </section>
               <section>
                 <h3><a href="/products/mixer-i8.html">Hand Mixer</a></h3>
                 <p><b>৳ 1,200</b></p>
               </section>"#,
        );

        assert_eq!(result.diagnostics.matched_strategy, Some("currency"));
        assert_eq!(
            result.products,
            vec![
                ScrapedProduct::new(
                    "Hand Mixer",
                    1200.0,
                    "https://www.daraz.com.bd/products/mixer-i8.html"
                ),
                ScrapedProduct::new(
                    "Steam Iron",
                    1800.0,
                    "https://www.daraz.com.bd/products/iron-i7.html"
                ),
            ]
        );
    }

    #[test]
    fn test_currency_scan_stops_after_five_levels() {
        let result = scrape(
            r#"<article><a href="/products/far-i1.html">Far</a>
                 <div><div><div><div><div><div><b>৳ 10</b></div></div></div></div></div></div>
               </article>"#,
        );
        assert!(result.products.is_empty());
    }

    #[test]
    fn test_empty_page_reports_diagnostics() {
        let result = scrape("<html><body><p>No results</p></body></html>");
        assert!(result.products.is_empty());
        let debug = result.diagnostics.to_string();
        assert!(debug.contains("Trying classic cards: 0"));
        assert!(debug.contains("Trying generic approach"));
        assert!(debug.contains("Trying currency symbol approach"));
        assert!(debug.ends_with("Final unique products: 0"));
    }

    #[test]
    fn test_bad_href_is_recorded_and_skipped() {
        let document = Html::parse_document(
            r#"<div data-qa-locator="product-item">
                 <a href="/products/relative-i1.html" title="Relative"></a>
                 <span class="price">৳ 10</span>
               </div>
               <div data-qa-locator="product-item">
                 <a href="https://www.daraz.com.bd/products/abs-i2.html" title="Absolute"></a>
                 <span class="price">৳ 20</span>
               </div>"#,
        );
        let result = scrape_listing(&document, None);

        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].name, "Absolute");
        assert!(result
            .diagnostics
            .trail
            .iter()
            .any(|e| e.starts_with("Error parsing modern card")));
    }

    #[test]
    fn test_structure_survey() {
        let result = scrape(r#"<div class="gridItem"></div><div class="gridItem"></div>"#);
        let grid = result
            .diagnostics
            .structure
            .iter()
            .find(|s| s.label == "gridItems")
            .unwrap();
        assert_eq!(grid.count, 2);
    }

    #[test]
    fn test_rank_products_sorts_and_dedupes() {
        let products = vec![
            ScrapedProduct::new("A", 300.0, "https://x/products/a"),
            ScrapedProduct::new("B", 100.0, "https://x/products/b"),
            ScrapedProduct::new("A cheap", 200.0, "https://x/products/a"),
            ScrapedProduct::new("C", 100.0, "https://x/products/c"),
        ];
        let ranked = rank_products(products);

        assert_eq!(ranked.len(), 3);
        assert!(ranked.windows(2).all(|w| w[0].price <= w[1].price));
        let a = ranked.iter().find(|p| p.url == "https://x/products/a").unwrap();
        assert_eq!(a.price, 200.0);
        // Stable sort keeps B ahead of C at equal price
        assert_eq!(ranked[0].name, "B");
        assert_eq!(ranked[1].name, "C");
    }
}
