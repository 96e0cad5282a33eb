use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{PriceWatchError, Result};
use crate::domain::{PriceAlerts, PricePoint, TrackedProduct};
use crate::store::Repository;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            PriceWatchError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| PriceWatchError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn load_history(conn: &Connection, url: &str) -> Result<Vec<PricePoint>> {
        let mut stmt = conn.prepare(
            "SELECT price, timestamp FROM price_history WHERE url = ?1 ORDER BY id",
        )?;

        let history = stmt
            .query_map(params![url], |row| {
                Ok(PricePoint {
                    price: row.get(0)?,
                    timestamp: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(history)
    }
}

impl Repository for SqliteStore {
    fn get(&self, url: &str) -> Result<Option<TrackedProduct>> {
        let conn = self.lock()?;

        let product = conn
            .query_row(
                "SELECT name, current_price, lowest_price, highest_price, last_checked,
                        alert_below, alert_above
                 FROM tracked_products WHERE url = ?1",
                params![url],
                |row| {
                    Ok(TrackedProduct {
                        name: row.get(0)?,
                        current_price: row.get(1)?,
                        price_history: Vec::new(),
                        lowest_price: row.get(2)?,
                        highest_price: row.get(3)?,
                        last_checked: row.get(4)?,
                        price_alerts: PriceAlerts {
                            below: row.get(5)?,
                            above: row.get(6)?,
                        },
                    })
                },
            )
            .optional()?;

        match product {
            Some(mut product) => {
                product.price_history = Self::load_history(&conn, url)?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    fn put(&self, url: &str, product: &TrackedProduct) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO tracked_products
                 (url, name, current_price, lowest_price, highest_price, last_checked,
                  alert_below, alert_above)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(url) DO UPDATE SET
                 name = excluded.name,
                 current_price = excluded.current_price,
                 lowest_price = excluded.lowest_price,
                 highest_price = excluded.highest_price,
                 last_checked = excluded.last_checked,
                 alert_below = excluded.alert_below,
                 alert_above = excluded.alert_above",
            params![
                url,
                product.name,
                product.current_price,
                product.lowest_price,
                product.highest_price,
                product.last_checked,
                product.price_alerts.below,
                product.price_alerts.above,
            ],
        )?;

        tx.execute("DELETE FROM price_history WHERE url = ?1", params![url])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO price_history (url, price, timestamp) VALUES (?1, ?2, ?3)",
            )?;
            for point in &product.price_history {
                stmt.execute(params![url, point.price, point.timestamp])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn delete(&self, url: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM tracked_products WHERE url = ?1", params![url])?;
        Ok(())
    }

    fn urls(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT url FROM tracked_products ORDER BY url")?;
        let urls = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertKind;

    const URL: &str = "https://www.daraz.com.bd/products/kettle-i1.html";

    #[test]
    fn test_put_and_get() {
        let store = SqliteStore::in_memory().unwrap();
        let mut product = TrackedProduct::seed("Kettle", 1000.0, 1_000);
        product.record(800.0, 2_000);
        store.put(URL, &product).unwrap();

        let retrieved = store.get(URL).unwrap().unwrap();
        assert_eq!(retrieved, product);
        assert_eq!(retrieved.price_history.len(), 2);
        assert_eq!(retrieved.price_history[1], PricePoint::new(800.0, 2_000));
    }

    #[test]
    fn test_get_nonexistent() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get(URL).unwrap().is_none());
    }

    #[test]
    fn test_put_replaces_history() {
        let store = SqliteStore::in_memory().unwrap();
        let mut product = TrackedProduct::seed("Kettle", 1000.0, 1_000);
        store.put(URL, &product).unwrap();

        product.price_history = vec![PricePoint::new(900.0, 5_000)];
        product.current_price = 900.0;
        store.put(URL, &product).unwrap();

        let retrieved = store.get(URL).unwrap().unwrap();
        assert_eq!(retrieved.price_history, vec![PricePoint::new(900.0, 5_000)]);
        assert_eq!(retrieved.current_price, 900.0);
    }

    #[test]
    fn test_alerts_round_trip_nullable() {
        let store = SqliteStore::in_memory().unwrap();
        let mut product = TrackedProduct::seed("Kettle", 1000.0, 1_000);
        product.price_alerts.set(AlertKind::Below, Some(750.0));
        store.put(URL, &product).unwrap();

        let alerts = store.get(URL).unwrap().unwrap().price_alerts;
        assert_eq!(alerts.below, Some(750.0));
        assert_eq!(alerts.above, None);
    }

    #[test]
    fn test_delete_cascades_history() {
        let store = SqliteStore::in_memory().unwrap();
        let product = TrackedProduct::seed("Kettle", 1000.0, 1_000);
        store.put(URL, &product).unwrap();
        store.delete(URL).unwrap();

        assert!(store.get(URL).unwrap().is_none());
        let conn = store.lock().unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM price_history", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_urls_ordering() {
        let store = SqliteStore::in_memory().unwrap();
        let product = TrackedProduct::seed("P", 1.0, 1);
        store.put("https://x/products/c", &product).unwrap();
        store.put("https://x/products/a", &product).unwrap();
        store.put("https://x/products/b", &product).unwrap();

        assert_eq!(
            store.urls().unwrap(),
            vec![
                "https://x/products/a",
                "https://x/products/b",
                "https://x/products/c"
            ]
        );
        assert_eq!(store.all().unwrap().len(), 3);
    }

    #[test]
    fn test_on_disk_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pricewatch.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .put(URL, &TrackedProduct::seed("Kettle", 1000.0, 1_000))
                .unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        assert_eq!(reopened.get(URL).unwrap().unwrap().name, "Kettle");
    }
}
