pub mod product;
pub mod scraped;

pub use product::{
    format_time_ago, now_millis, AlertKind, PriceAlerts, PricePoint, TrackedProduct, DAY_MS,
    HISTORY_RETENTION_DAYS,
};
pub use scraped::ScrapedProduct;
