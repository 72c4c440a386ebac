//! Write-through cache for per-symbol financial data.
//!
//! This crate contains:
//! - Entity kinds and their identity keys
//! - Schema-free records and the identity-keyed merge
//! - An in-memory entity store persisted as one JSON snapshot
//! - Price batch normalization
//! - The [`FinancialCache`] facade and a cache-first [`CachedFetcher`]
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Thread-safe facade with per-kind get/set |
//! | [`config`] | Snapshot location resolution |
//! | [`domain`] | Typed provider models and date windows |
//! | [`error`] | Error taxonomy |
//! | [`fetch`] | Provider trait and read-through fetcher |
//! | [`kind`] | Entity kinds |
//! | [`merge`] | Identity-keyed batch merge |
//! | [`persistence`] | Atomic snapshot save and load |
//! | [`record`] | Scalar values and records |
//! | [`store`] | In-memory kind → symbol → collection map |
//! | [`validate`] | Price normalization |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use finx_cache::{CacheConfig, FinancialCache, Record};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = FinancialCache::open(CacheConfig::default());
//!
//!     let bar: Record = serde_json::from_str(
//!         r#"{"time":"2024-01-02","open":1,"close":2,"high":2,"low":1,"volume":100}"#,
//!     )?;
//!     cache.set_prices("VNM", vec![bar])?;
//!
//!     assert_eq!(cache.get_prices("VNM").map(|bars| bars.len()), Some(1));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod kind;
pub mod merge;
pub mod persistence;
pub mod record;
pub mod store;
pub mod validate;

pub use cache::{Durability, FinancialCache, LoadStatus};
pub use config::{CacheConfig, CACHE_PATH_ENV};
pub use domain::{
    CompanyNews, DateRange, FinancialMetrics, InsiderTrade, IsoDate, LineItem, Price, ReportPeriod,
};
pub use error::{
    BatchSide, CacheError, DeserializationError, PersistenceError, PreconditionError,
    ValidationError,
};
pub use fetch::{
    CachedFetcher, FetchError, MarketDataProvider, ProviderError, ProviderErrorKind,
};
pub use kind::EntityKind;
pub use merge::merge;
pub use persistence::{LoadOutcome, SnapshotFile};
pub use record::{Collection, IdentityValue, Record, Scalar};
pub use store::{EntityStore, KindStats, SymbolMap};
pub use validate::normalize_prices;
