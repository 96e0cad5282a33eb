//! CSS selectors for Daraz product and search pages.
//!
//! The site's markup changes often. Ranked lists are tried first to last;
//! when extraction starts failing, capture a page sample, add the new
//! selector at the front of the relevant list, and add a test fixture.

use std::sync::LazyLock;

use scraper::Selector;

/// Local currency glyph (Bangladeshi Taka).
pub const CURRENCY_GLYPH: char = '৳';

fn parse(selector: &str) -> Selector {
    Selector::parse(selector).unwrap()
}

fn ranked(selectors: &[&str]) -> Vec<Selector> {
    selectors.iter().map(|s| parse(s)).collect()
}

/// Every element, in document order.
pub static ANY: LazyLock<Selector> = LazyLock::new(|| parse("*"));

pub static SPAN: LazyLock<Selector> = LazyLock::new(|| parse("span"));

pub static LINK: LazyLock<Selector> = LazyLock::new(|| parse("a[href]"));

/// Anchors whose href points at a product page.
pub static PRODUCT_LINK: LazyLock<Selector> =
    LazyLock::new(|| parse("a[href*=\"/products/\"]"));

/// Selectors for a single product page.
pub mod product {
    use super::*;

    /// Price text, primary selector first.
    pub static PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        ranked(&[
            ".pdp-price",
            ".pdp-product-price",
            "[data-spm=\"price\"] span",
            "[data-pdp-price]",
            ".price-box__content",
        ])
    });

    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| parse(".pdp-mod-product-badge-title"));

    pub static DOCUMENT_TITLE: LazyLock<Selector> = LazyLock::new(|| parse("title"));
}

/// Current search-result card layout.
pub mod modern {
    use super::*;

    pub static CARD: LazyLock<Selector> = LazyLock::new(|| {
        parse(
            "[data-qa-locator=\"product-item\"], \
             .box--ujueT, \
             [data-tracking=\"product-card\"]",
        )
    });

    pub static NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        ranked(&[
            "[data-qa-locator=\"product-name\"]",
            ".title--wFj93",
            ".name__Ut7Yj",
        ])
    });

    pub static TITLED_LINK: LazyLock<Selector> = LazyLock::new(|| parse("a[title]"));

    pub static PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        ranked(&[
            ".price--NVB62 span",
            "[data-spm=\"price\"] span",
            ".currency--GVKjl",
            ".pdp-price",
            ".price",
        ])
    });
}

/// Older search-result card layout.
pub mod classic {
    use super::*;

    pub static CARD: LazyLock<Selector> = LazyLock::new(|| {
        parse(".gridItem, .c1_t2i, .c2prKI, .c2prp4, .Product--nH1LGn")
    });

    pub static NAME: LazyLock<Vec<Selector>> =
        LazyLock::new(|| ranked(&[".title", ".c16H9d", ".c3KeDq", ".title--wFj93"]));
}

/// Structural probes reported in scrape diagnostics, for spotting selector drift.
pub static STRUCTURE: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    [
        ("gridItems", ".gridItem"),
        ("c1_t2i", ".c1_t2i"),
        ("c2prKI", ".c2prKI"),
        ("productItems", "[data-qa-locator=\"product-item\"]"),
        ("listItems", ".list-item"),
        ("boxItems", ".box--ujueT"),
        ("priceSections", "[data-spm=\"price\"]"),
        (
            "productCards",
            ".product-card, .product-item, [data-tracking=\"product-card\"]",
        ),
    ]
    .into_iter()
    .map(|(label, selector)| (label, parse(selector)))
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_selectors_compile() {
        assert_eq!(product::PRICE.len(), 5);
        assert_eq!(modern::NAME.len(), 3);
        assert_eq!(modern::PRICE.len(), 5);
        assert_eq!(classic::NAME.len(), 4);
        assert_eq!(STRUCTURE.len(), 8);
        LazyLock::force(&ANY);
        LazyLock::force(&SPAN);
        LazyLock::force(&LINK);
        LazyLock::force(&PRODUCT_LINK);
        LazyLock::force(&product::TITLE);
        LazyLock::force(&product::DOCUMENT_TITLE);
        LazyLock::force(&modern::CARD);
        LazyLock::force(&modern::TITLED_LINK);
        LazyLock::force(&classic::CARD);
    }
}
