use serde::{Deserialize, Serialize};

/// A product found on a search-results page. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedProduct {
    pub name: String,
    pub price: f64,
    pub url: String,
}

impl ScrapedProduct {
    pub fn new(name: impl Into<String>, price: f64, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            url: url.into(),
        }
    }
}
