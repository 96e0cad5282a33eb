//! Typed request/response front end over the history store and loaders.
//!
//! Requests arrive as JSON objects tagged by `action`:
//!
//! ```text
//! {"action":"toggleTracking","url":"https://…","name":"Kettle","price":1200}
//! {"action":"searchProducts","searchUrl":"https://www.daraz.com.bd/catalog/?q=kettle"}
//! ```
//!
//! [`serve_lines`] answers one request per input line with one JSON response
//! per output line.

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use url::Url;

use crate::app::{PriceWatchError, Result};
use crate::domain::{now_millis, AlertKind, PriceAlerts, ScrapedProduct, TrackedProduct};
use crate::extract::{extract_product_info, scrape_listing, ListingScrape, ProductInfo};
use crate::history::{HistoryStore, RecordOutcome};
use crate::loader::{LoaderConfig, PageLoader};
use crate::store::Repository;

pub const CATALOG_URL: &str = "https://www.daraz.com.bd/catalog/";

/// Catalog search for `query`, cheapest first.
pub fn catalog_search_url(query: &str) -> Result<Url> {
    Ok(Url::parse_with_params(
        CATALOG_URL,
        &[("q", query.trim()), ("sort", "price_asc")],
    )?)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    UpdatePrice {
        url: String,
        price: f64,
        #[serde(default)]
        name: String,
    },
    GetProductData {
        url: String,
    },
    ToggleTracking {
        url: String,
        #[serde(default)]
        name: String,
        price: f64,
    },
    SearchProducts {
        #[serde(rename = "searchUrl")]
        search_url: String,
    },
    SetPriceAlert {
        url: String,
        #[serde(rename = "alertType")]
        alert_type: AlertKind,
        #[serde(default)]
        price: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `{}`
    Ack {},
    /// The stored product, or `null` when untracked
    Product(Option<TrackedProduct>),
    Tracking {
        #[serde(rename = "isTracking")]
        is_tracking: bool,
    },
    Search {
        products: Vec<ScrapedProduct>,
        #[serde(rename = "debugInfo")]
        debug_info: String,
    },
    SearchFailed {
        error: String,
        #[serde(rename = "debugInfo")]
        debug_info: String,
    },
    Alert {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        alerts: Option<PriceAlerts>,
    },
    Failed {
        error: String,
    },
}

impl Response {
    fn failed(error: impl std::fmt::Display) -> Self {
        Response::Failed {
            error: error.to_string(),
        }
    }
}

pub struct Service<R> {
    history: Arc<HistoryStore<R>>,
    loader: Arc<dyn PageLoader>,
    product_settle: Duration,
    search_settle: Duration,
}

impl<R: Repository> Service<R> {
    pub fn new(
        history: Arc<HistoryStore<R>>,
        loader: Arc<dyn PageLoader>,
        config: &LoaderConfig,
    ) -> Self {
        Self {
            history,
            loader,
            product_settle: config.product_settle(),
            search_settle: config.search_settle(),
        }
    }

    pub fn history(&self) -> &Arc<HistoryStore<R>> {
        &self.history
    }

    pub async fn handle(&self, request: Request) -> Response {
        debug!("Handling {:?}", request);
        match request {
            Request::UpdatePrice { url, price, name } => {
                match self.history.record_price(&url, price, &name, now_millis()) {
                    Ok(_) => Response::Ack {},
                    Err(e) => {
                        warn!("Failed to update price for {}: {}", url, e);
                        Response::failed(e)
                    }
                }
            }
            Request::GetProductData { url } => match self.history.get_product(&url) {
                Ok(product) => Response::Product(product),
                Err(e) => Response::failed(e),
            },
            Request::ToggleTracking { url, name, price } => {
                match self.history.toggle_tracking(&url, &name, price) {
                    Ok(is_tracking) => Response::Tracking { is_tracking },
                    Err(e) => Response::failed(e),
                }
            }
            Request::SearchProducts { search_url } => match self.search(&search_url).await {
                Ok(scrape) => Response::Search {
                    debug_info: scrape.diagnostics.to_string(),
                    products: scrape.products,
                },
                Err(e) => {
                    warn!("Search failed for {}: {}", search_url, e);
                    Response::SearchFailed {
                        debug_info: format!("Page load error: {}", e),
                        error: e.to_string(),
                    }
                }
            },
            Request::SetPriceAlert {
                url,
                alert_type,
                price,
            } => match self.history.set_alert(&url, alert_type, price) {
                Ok(alerts) => Response::Alert {
                    success: true,
                    alerts: Some(alerts),
                },
                Err(PriceWatchError::ProductNotFound(_)) => Response::Alert {
                    success: false,
                    alerts: None,
                },
                Err(e) => Response::failed(e),
            },
        }
    }

    /// Load a search-results page and scrape its product cards.
    pub async fn search(&self, search_url: &str) -> Result<ListingScrape> {
        let base = Url::parse(search_url)?;
        let html = self.loader.load(base.as_str(), self.search_settle).await?;
        let document = Html::parse_document(&html);
        Ok(scrape_listing(&document, Some(&base)))
    }

    /// Load a product page and read its name and price.
    pub async fn inspect(&self, url: &str) -> Result<ProductInfo> {
        let html = self.loader.load(url, self.product_settle).await?;
        let document = Html::parse_document(&html);
        Ok(extract_product_info(&document))
    }

    /// Load a product page and record the price if the product is tracked.
    pub async fn visit(&self, url: &str) -> Result<Option<RecordOutcome>> {
        let info = self.inspect(url).await?;
        match info.price {
            Some(price) => {
                let name = info.name.unwrap_or_default();
                self.history
                    .record_price(url, price, &name, now_millis())
                    .map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Answer JSON requests line by line until `reader` is exhausted.
pub async fn serve_lines<R, I, O>(service: &Service<R>, reader: I, mut writer: O) -> Result<()>
where
    R: Repository,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => service.handle(request).await,
            Err(e) => Response::failed(format!("Invalid request: {}", e)),
        };

        let mut out = serde_json::to_vec(&response)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }
    Ok(())
}
