use std::path::PathBuf;
use std::sync::Arc;

use crate::alert::LogNotifier;
use crate::app::error::{PriceWatchError, Result};
use crate::checker::PriceChecker;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::loader::{build_loader, PageLoader};
use crate::service::Service;
use crate::store::sqlite::SqliteStore;

pub struct AppContext {
    pub history: Arc<HistoryStore<SqliteStore>>,
    pub loader: Arc<dyn PageLoader>,
    pub service: Service<SqliteStore>,
    pub checker: PriceChecker<SqliteStore>,
    pub config: Config,
}

impl AppContext {
    /// Open the database at `db_path`, falling back to the configured store
    /// path and then the platform data directory.
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path.or_else(|| config.store.path.clone()) {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = SqliteStore::new(&db_path)?;
        Self::with_store(store, config)
    }

    fn with_store(store: SqliteStore, config: Config) -> Result<Self> {
        let history = Arc::new(HistoryStore::new(Arc::new(store), Arc::new(LogNotifier)));
        let loader = build_loader(&config.loader)?;
        let service = Service::new(history.clone(), loader.clone(), &config.loader);
        let checker = PriceChecker::new(
            history.clone(),
            loader.clone(),
            config.loader.product_settle(),
        );

        Ok(Self {
            history,
            loader,
            service,
            checker,
            config,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| PriceWatchError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("pricewatch");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("pricewatch.db"))
    }
}
