//! Cache-first access to an upstream market data provider.
//!
//! [`CachedFetcher`] answers from the cache when the cached collection covers
//! the request and otherwise asks the provider, caching whatever comes back.
//! The provider is an external collaborator; this module knows nothing about
//! how it talks to the outside world.

use std::cmp::Reverse;
use std::fmt::{Display, Formatter};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    CompanyNews, DateRange, FinancialMetrics, InsiderTrade, IsoDate, LineItem, Price, ReportPeriod,
};
use crate::error::{CacheError, ValidationError};
use crate::record::Record;
use crate::{EntityKind, FinancialCache};

/// Provider-side failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Error reported by a [`MarketDataProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
}

impl ProviderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Internal, message)
    }

    fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::Unavailable | ProviderErrorKind::RateLimited
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::InvalidRequest => "provider.invalid_request",
            ProviderErrorKind::Internal => "provider.internal",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Upstream source of typed financial records.
pub trait MarketDataProvider {
    fn prices(&self, symbol: &str, range: &DateRange) -> Result<Vec<Price>, ProviderError>;

    fn financial_metrics(
        &self,
        symbol: &str,
        end: &IsoDate,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<FinancialMetrics>, ProviderError>;

    fn line_items(
        &self,
        symbol: &str,
        names: &[String],
        end: &IsoDate,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<LineItem>, ProviderError>;

    fn insider_trades(
        &self,
        symbol: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<InsiderTrade>, ProviderError>;

    fn company_news(
        &self,
        symbol: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<CompanyNews>, ProviderError>;
}

impl<P> MarketDataProvider for &P
where
    P: MarketDataProvider + ?Sized,
{
    fn prices(&self, symbol: &str, range: &DateRange) -> Result<Vec<Price>, ProviderError> {
        (**self).prices(symbol, range)
    }

    fn financial_metrics(
        &self,
        symbol: &str,
        end: &IsoDate,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<FinancialMetrics>, ProviderError> {
        (**self).financial_metrics(symbol, end, period, limit)
    }

    fn line_items(
        &self,
        symbol: &str,
        names: &[String],
        end: &IsoDate,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<LineItem>, ProviderError> {
        (**self).line_items(symbol, names, end, period, limit)
    }

    fn insider_trades(
        &self,
        symbol: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<InsiderTrade>, ProviderError> {
        (**self).insider_trades(symbol, range, limit)
    }

    fn company_news(
        &self,
        symbol: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<CompanyNews>, ProviderError> {
        (**self).company_news(symbol, range, limit)
    }
}

/// Serves provider requests from a [`FinancialCache`] when possible.
pub struct CachedFetcher<'a, P> {
    cache: &'a FinancialCache,
    provider: P,
}

impl<'a, P> CachedFetcher<'a, P>
where
    P: MarketDataProvider,
{
    pub fn new(cache: &'a FinancialCache, provider: P) -> Self {
        Self { cache, provider }
    }

    /// Daily prices inside `range`, oldest first.
    pub fn prices(&self, symbol: &str, range: &DateRange) -> Result<Vec<Price>, FetchError> {
        let mut cached = self.cached(EntityKind::Prices, symbol, |record| {
            record.get_str("time").is_some_and(|time| range.contains(time))
        });
        if !cached.is_empty() {
            debug!(symbol, "serving prices from cache");
            sort_by_date(&mut cached, "time", Order::Ascending);
            return to_models(&cached);
        }

        let mut fetched = self.provider.prices(symbol, range)?;
        self.store(EntityKind::Prices, symbol, &fetched)?;
        fetched.sort_by(|left, right| left.time.cmp(&right.time));
        Ok(fetched)
    }

    /// Up to `limit` reports on or before `end`, newest first.
    pub fn financial_metrics(
        &self,
        symbol: &str,
        end: &IsoDate,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<FinancialMetrics>, FetchError> {
        let cached = self.cached_reports(EntityKind::FinancialMetrics, symbol, end, period, limit);
        if !cached.is_empty() {
            debug!(symbol, "serving financial metrics from cache");
            return to_models(&cached);
        }

        let fetched = self.provider.financial_metrics(symbol, end, period, limit)?;
        self.store(EntityKind::FinancialMetrics, symbol, &fetched)?;
        Ok(fetched)
    }

    /// Up to `limit` reports on or before `end`, newest first. The cache is
    /// used only when every requested line item has a value in at least one
    /// of those reports.
    pub fn line_items(
        &self,
        symbol: &str,
        names: &[String],
        end: &IsoDate,
        period: ReportPeriod,
        limit: usize,
    ) -> Result<Vec<LineItem>, FetchError> {
        let cached = self.cached_reports(EntityKind::LineItems, symbol, end, period, limit);
        let covered = names.iter().all(|name| {
            cached
                .iter()
                .any(|record| record.get_present(name).is_some())
        });
        if !cached.is_empty() && covered {
            debug!(symbol, "serving line items from cache");
            return to_models(&cached);
        }

        let fetched = self
            .provider
            .line_items(symbol, names, end, period, limit)?;
        self.store(EntityKind::LineItems, symbol, &fetched)?;
        Ok(fetched)
    }

    /// Trades inside `range` by transaction date (falling back to the filing
    /// date), newest first.
    pub fn insider_trades(
        &self,
        symbol: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<InsiderTrade>, FetchError> {
        let mut cached = self.cached(EntityKind::InsiderTrades, symbol, |record| {
            trade_date(record).is_some_and(|date| range.contains(date))
        });
        if !cached.is_empty() {
            debug!(symbol, "serving insider trades from cache");
            cached.sort_by(|left, right| trade_date(right).cmp(&trade_date(left)));
            cached.truncate(limit);
            return to_models(&cached);
        }

        let fetched = self.provider.insider_trades(symbol, range, limit)?;
        self.store(EntityKind::InsiderTrades, symbol, &fetched)?;
        Ok(fetched)
    }

    /// News inside `range`, newest first.
    pub fn company_news(
        &self,
        symbol: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<CompanyNews>, FetchError> {
        let mut cached = self.cached(EntityKind::CompanyNews, symbol, |record| {
            record.get_str("date").is_some_and(|date| range.contains(date))
        });
        if !cached.is_empty() {
            debug!(symbol, "serving company news from cache");
            sort_by_date(&mut cached, "date", Order::Descending);
            cached.truncate(limit);
            return to_models(&cached);
        }

        let fetched = self.provider.company_news(symbol, range, limit)?;
        self.store(EntityKind::CompanyNews, symbol, &fetched)?;
        Ok(fetched)
    }

    fn cached(
        &self,
        kind: EntityKind,
        symbol: &str,
        keep: impl Fn(&Record) -> bool,
    ) -> Vec<Record> {
        self.cache
            .get(kind, symbol)
            .unwrap_or_default()
            .into_iter()
            .filter(|record| keep(record))
            .collect()
    }

    fn cached_reports(
        &self,
        kind: EntityKind,
        symbol: &str,
        end: &IsoDate,
        period: ReportPeriod,
        limit: usize,
    ) -> Vec<Record> {
        let mut cached = self.cached(kind, symbol, |record| {
            let in_window = record
                .get_str("report_period")
                .is_some_and(|report| end.is_on_or_before(report));
            let same_period = record
                .get_str("period")
                .is_none_or(|value| value == period.as_str());
            in_window && same_period
        });
        sort_by_date(&mut cached, "report_period", Order::Descending);
        cached.truncate(limit);
        cached
    }

    fn store<T>(&self, kind: EntityKind, symbol: &str, models: &[T]) -> Result<(), FetchError>
    where
        T: Serialize,
    {
        if models.is_empty() {
            return Ok(());
        }

        let records = models
            .iter()
            .map(Record::from_model)
            .collect::<Result<Vec<_>, _>>()?;
        self.cache.set(kind, symbol, records)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Order {
    Ascending,
    Descending,
}

fn sort_by_date(records: &mut [Record], field: &str, order: Order) {
    match order {
        Order::Ascending => {
            records.sort_by(|left, right| left.get_str(field).cmp(&right.get_str(field)))
        }
        Order::Descending => {
            records.sort_by_key(|record| Reverse(record.get_str(field).map(str::to_owned)))
        }
    }
}

fn trade_date(record: &Record) -> Option<&str> {
    record
        .get_str("transaction_date")
        .or_else(|| record.get_str("filing_date"))
}

fn to_models<T>(records: &[Record]) -> Result<Vec<T>, FetchError>
where
    T: DeserializeOwned,
{
    records
        .iter()
        .map(|record| record.to_model().map_err(FetchError::from))
        .collect()
}
