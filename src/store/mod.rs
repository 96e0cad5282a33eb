pub mod memory;
pub mod sqlite;

use crate::app::Result;
use crate::domain::TrackedProduct;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persistence for tracked products, keyed by product URL.
///
/// Writes replace the whole record; concurrent writers get last-writer-wins.
pub trait Repository {
    fn get(&self, url: &str) -> Result<Option<TrackedProduct>>;
    fn put(&self, url: &str, product: &TrackedProduct) -> Result<()>;
    fn delete(&self, url: &str) -> Result<()>;
    /// All tracked URLs, sorted.
    fn urls(&self) -> Result<Vec<String>>;

    fn all(&self) -> Result<Vec<(String, TrackedProduct)>> {
        let mut products = Vec::new();
        for url in self.urls()? {
            if let Some(product) = self.get(&url)? {
                products.push((url, product));
            }
        }
        Ok(products)
    }
}
