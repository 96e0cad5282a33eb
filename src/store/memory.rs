use std::collections::HashMap;
use std::sync::Mutex;

use crate::app::{PriceWatchError, Result};
use crate::domain::TrackedProduct;
use crate::store::Repository;

/// Non-persistent store for tests and one-off runs.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<HashMap<String, TrackedProduct>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, TrackedProduct>>> {
        self.products
            .lock()
            .map_err(|e| PriceWatchError::Other(format!("Store lock poisoned: {}", e)))
    }
}

impl Repository for MemoryStore {
    fn get(&self, url: &str) -> Result<Option<TrackedProduct>> {
        Ok(self.lock()?.get(url).cloned())
    }

    fn put(&self, url: &str, product: &TrackedProduct) -> Result<()> {
        self.lock()?.insert(url.to_string(), product.clone());
        Ok(())
    }

    fn delete(&self, url: &str) -> Result<()> {
        self.lock()?.remove(url);
        Ok(())
    }

    fn urls(&self) -> Result<Vec<String>> {
        let mut urls: Vec<String> = self.lock()?.keys().cloned().collect();
        urls.sort();
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        let product = TrackedProduct::seed("Phone", 100.0, 1);

        store.put("https://x/products/p", &product).unwrap();
        assert_eq!(store.get("https://x/products/p").unwrap(), Some(product));

        store.delete("https://x/products/p").unwrap();
        assert_eq!(store.get("https://x/products/p").unwrap(), None);
    }

    #[test]
    fn test_urls_sorted() {
        let store = MemoryStore::new();
        let product = TrackedProduct::seed("P", 1.0, 1);
        store.put("https://x/b", &product).unwrap();
        store.put("https://x/a", &product).unwrap();

        assert_eq!(store.urls().unwrap(), vec!["https://x/a", "https://x/b"]);
        assert_eq!(store.all().unwrap().len(), 2);
    }
}
