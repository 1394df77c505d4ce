use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{info, warn};

use fintrack_config::{Config, ConfigManager};
use fintrack_core::{Clock, Services, SystemClock};
use fintrack_domain::Amount;
use fintrack_storage_sqlite::SqliteLedgerStore;

use crate::{errors::FinTrackResult, utils::paths};

/// Owns the single database handle of the process and the services bound to it.
///
/// Opening resolves the configuration and the database file; [`FinanceApp::close`]
/// releases the connection.
pub struct FinanceApp {
    store: Arc<SqliteLedgerStore>,
    services: Services,
    config: Config,
    home: PathBuf,
}

impl FinanceApp {
    /// Opens the application rooted at `$FINTRACK_HOME` or `~/.fintrack`.
    pub fn open_default() -> FinTrackResult<Self> {
        Self::open(paths::app_data_dir())
    }

    /// Loads `<home>/config.json` (defaults when absent) and opens the ledger it names.
    pub fn open(home: impl Into<PathBuf>) -> FinTrackResult<Self> {
        let home = home.into();
        let config = ConfigManager::with_base_dir(home.clone())?.load()?;
        Self::with_config(home, config, Arc::new(SystemClock))
    }

    /// Opens the ledger `config` names. Installs tracing with `config.log_filter`
    /// unless a subscriber is already in place.
    pub fn with_config(
        home: impl Into<PathBuf>,
        config: Config,
        clock: Arc<dyn Clock>,
    ) -> FinTrackResult<Self> {
        crate::init_with_filter(&config.log_filter);
        let home = home.into();
        let database = config.resolve_database_file(&home);
        let store = Arc::new(SqliteLedgerStore::open(&database)?);
        let services = Services::new(store.clone(), clock);
        info!(database = %database.display(), "finance app opened");
        Ok(Self {
            store,
            services,
            config,
            home,
        })
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.store.path()
    }

    /// Renders `amount` in the configured currency and locale.
    pub fn format_amount(&self, amount: Amount) -> String {
        self.config.format_amount(amount.units())
    }

    /// Persists `config` as the application's configuration. Takes effect on
    /// the next open.
    pub fn save_config(&self, config: &Config) -> FinTrackResult<()> {
        ConfigManager::with_base_dir(self.home.clone())?.save(config)?;
        Ok(())
    }

    /// Drops every service and closes the database connection.
    pub fn close(self) -> FinTrackResult<()> {
        let Self {
            store, services, ..
        } = self;
        drop(services);
        match Arc::try_unwrap(store) {
            Ok(store) => store.close()?,
            Err(_) => warn!("store still shared at close; connection released on last drop"),
        }
        info!("finance app closed");
        Ok(())
    }
}
