//! Write-through cache facade.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, warn};

use crate::error::CacheError;
use crate::merge::merge;
use crate::persistence::{LoadOutcome, SnapshotFile};
use crate::record::{Collection, Record};
use crate::store::{EntityStore, KindStats};
use crate::validate::{ensure_symbol, normalize_prices};
use crate::{CacheConfig, EntityKind};

/// Whether a mutation reached the snapshot file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    Persisted,
    /// The snapshot write failed and was logged; the in-memory state is still
    /// updated and authoritative.
    InMemoryOnly,
}

/// Outcome of the explicit startup load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    NotFound,
}

/// Per-process cache of provider data, persisted on every mutation.
///
/// The store lock is held across the whole read, merge, update and save
/// sequence, so concurrent writers to the same symbol cannot interleave.
#[derive(Debug)]
pub struct FinancialCache {
    store: Mutex<EntityStore>,
    snapshot: SnapshotFile,
}

impl Default for FinancialCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl FinancialCache {
    /// Creates an empty cache. Nothing is read from disk until
    /// [`FinancialCache::initialize`] is called.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: Mutex::new(EntityStore::new()),
            snapshot: SnapshotFile::from_config(&config),
        }
    }

    /// Creates a cache and loads the configured snapshot, starting empty when
    /// the snapshot is missing or unusable.
    pub fn open(config: CacheConfig) -> Self {
        let cache = Self::new(config);
        match cache.initialize() {
            Ok(LoadStatus::Loaded) => {}
            Ok(LoadStatus::NotFound) => {
                debug!(path = %cache.snapshot_path().display(), "no cache snapshot yet");
            }
            Err(error) => {
                warn!(
                    path = %cache.snapshot_path().display(),
                    %error,
                    "failed to load cache snapshot; starting empty"
                );
            }
        }
        cache
    }

    /// Loads the configured snapshot into this cache.
    pub fn initialize(&self) -> Result<LoadStatus, CacheError> {
        self.load_from(&self.snapshot)
    }

    /// Replaces the whole store with the snapshot at `path`. On any error the
    /// current contents are kept.
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<LoadStatus, CacheError> {
        self.load_from(&SnapshotFile::new(path.as_ref()))
    }

    fn load_from(&self, file: &SnapshotFile) -> Result<LoadStatus, CacheError> {
        match file.load()? {
            LoadOutcome::Loaded(loaded) => {
                *self.lock() = loaded;
                Ok(LoadStatus::Loaded)
            }
            LoadOutcome::NotFound => Ok(LoadStatus::NotFound),
        }
    }

    /// Writes the current store to `path` without changing the configured
    /// snapshot location.
    pub fn save_path(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let store = self.lock();
        SnapshotFile::new(path.as_ref()).save(&store)?;
        Ok(())
    }

    pub fn snapshot_path(&self) -> &Path {
        self.snapshot.path()
    }

    /// Returns the cached collection, or `None` if `symbol` was never cached
    /// for `kind`.
    pub fn get(&self, kind: EntityKind, symbol: &str) -> Option<Collection> {
        self.lock().get_collection(kind, symbol.trim()).cloned()
    }

    /// Merges `batch` into the cached collection for `symbol` and persists the
    /// whole store.
    pub fn set(
        &self,
        kind: EntityKind,
        symbol: &str,
        batch: Vec<Record>,
    ) -> Result<Durability, CacheError> {
        let symbol = ensure_symbol(symbol)?;
        let batch = match kind {
            EntityKind::Prices => normalize_prices(batch)?,
            _ => batch,
        };

        let mut store = self.lock();
        let merged = merge(
            store.get_collection(kind, symbol).map(Vec::as_slice),
            batch,
            kind.identity_key(),
        )?;
        store.put_collection(kind, symbol, merged);
        Ok(self.persist(&store))
    }

    /// Drops every cached collection and persists the empty store.
    pub fn clear(&self) -> Durability {
        let mut store = self.lock();
        store.clear_all();
        self.persist(&store)
    }

    pub fn stats(&self) -> Vec<KindStats> {
        self.lock().stats()
    }

    pub fn symbols(&self, kind: EntityKind) -> Vec<String> {
        self.lock()
            .symbols(kind)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn get_prices(&self, symbol: &str) -> Option<Collection> {
        self.get(EntityKind::Prices, symbol)
    }

    pub fn set_prices(&self, symbol: &str, batch: Vec<Record>) -> Result<Durability, CacheError> {
        self.set(EntityKind::Prices, symbol, batch)
    }

    pub fn get_financial_metrics(&self, symbol: &str) -> Option<Collection> {
        self.get(EntityKind::FinancialMetrics, symbol)
    }

    pub fn set_financial_metrics(
        &self,
        symbol: &str,
        batch: Vec<Record>,
    ) -> Result<Durability, CacheError> {
        self.set(EntityKind::FinancialMetrics, symbol, batch)
    }

    pub fn get_line_items(&self, symbol: &str) -> Option<Collection> {
        self.get(EntityKind::LineItems, symbol)
    }

    pub fn set_line_items(
        &self,
        symbol: &str,
        batch: Vec<Record>,
    ) -> Result<Durability, CacheError> {
        self.set(EntityKind::LineItems, symbol, batch)
    }

    pub fn get_insider_trades(&self, symbol: &str) -> Option<Collection> {
        self.get(EntityKind::InsiderTrades, symbol)
    }

    pub fn set_insider_trades(
        &self,
        symbol: &str,
        batch: Vec<Record>,
    ) -> Result<Durability, CacheError> {
        self.set(EntityKind::InsiderTrades, symbol, batch)
    }

    pub fn get_company_news(&self, symbol: &str) -> Option<Collection> {
        self.get(EntityKind::CompanyNews, symbol)
    }

    pub fn set_company_news(
        &self,
        symbol: &str,
        batch: Vec<Record>,
    ) -> Result<Durability, CacheError> {
        self.set(EntityKind::CompanyNews, symbol, batch)
    }

    fn persist(&self, store: &EntityStore) -> Durability {
        match self.snapshot.save(store) {
            Ok(()) => Durability::Persisted,
            Err(error) => {
                error!(
                    path = %self.snapshot.path().display(),
                    %error,
                    "failed to save cache snapshot; continuing in memory"
                );
                Durability::InMemoryOnly
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, EntityStore> {
        // A panic mid-merge never leaves a half-written collection behind, so a
        // poisoned store is still consistent.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
