//! Behavior-driven tests for cache-first fetching
//!
//! A fake provider counts its calls so each test can tell whether a request
//! was answered from the cache or went upstream.

use std::cell::Cell;
use std::collections::BTreeMap;

use finx_cache::{
    CacheConfig, CachedFetcher, CompanyNews, DateRange, FetchError, FinancialCache,
    FinancialMetrics, InsiderTrade, IsoDate, LineItem, MarketDataProvider, Price, ProviderError,
    ReportPeriod, Scalar,
};
use tempfile::{tempdir, TempDir};

#[derive(Default)]
struct FakeProvider {
    prices: Vec<Price>,
    metrics: Vec<FinancialMetrics>,
    line_items: Vec<LineItem>,
    trades: Vec<InsiderTrade>,
    news: Vec<CompanyNews>,
    failure: Option<ProviderError>,
    calls: Cell<usize>,
}

impl FakeProvider {
    fn respond<T: Clone>(&self, rows: &[T]) -> Result<Vec<T>, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(rows.to_vec()),
        }
    }
}

impl MarketDataProvider for FakeProvider {
    fn prices(&self, _symbol: &str, _range: &DateRange) -> Result<Vec<Price>, ProviderError> {
        self.respond(&self.prices)
    }

    fn financial_metrics(
        &self,
        _symbol: &str,
        _end: &IsoDate,
        _period: ReportPeriod,
        _limit: usize,
    ) -> Result<Vec<FinancialMetrics>, ProviderError> {
        self.respond(&self.metrics)
    }

    fn line_items(
        &self,
        _symbol: &str,
        _names: &[String],
        _end: &IsoDate,
        _period: ReportPeriod,
        _limit: usize,
    ) -> Result<Vec<LineItem>, ProviderError> {
        self.respond(&self.line_items)
    }

    fn insider_trades(
        &self,
        _symbol: &str,
        _range: &DateRange,
        _limit: usize,
    ) -> Result<Vec<InsiderTrade>, ProviderError> {
        self.respond(&self.trades)
    }

    fn company_news(
        &self,
        _symbol: &str,
        _range: &DateRange,
        _limit: usize,
    ) -> Result<Vec<CompanyNews>, ProviderError> {
        self.respond(&self.news)
    }
}

fn fresh_cache() -> (TempDir, FinancialCache) {
    let temp = tempdir().expect("tempdir");
    let cache = FinancialCache::new(CacheConfig::at(temp.path().join("cache.json")));
    (temp, cache)
}

fn price(time: &str, close: f64) -> Price {
    Price {
        time: time.to_string(),
        open: close,
        close,
        high: close,
        low: close,
        volume: 100,
    }
}

fn metrics(report_period: &str, period: &str, pe: f64) -> FinancialMetrics {
    FinancialMetrics {
        ticker: "VNM".to_string(),
        report_period: report_period.to_string(),
        period: period.to_string(),
        currency: Some("VND".to_string()),
        metrics: BTreeMap::from([("price_to_earnings_ratio".to_string(), Some(pe))]),
    }
}

fn trade(filing_date: &str, transaction_date: Option<&str>) -> InsiderTrade {
    InsiderTrade {
        ticker: "VNM".to_string(),
        issuer: None,
        name: Some("Insider".to_string()),
        title: None,
        is_board_director: Some(true),
        transaction_date: transaction_date.map(str::to_string),
        transaction_shares: Some(1_000.0),
        transaction_price_per_share: None,
        transaction_value: None,
        shares_owned_before_transaction: None,
        shares_owned_after_transaction: None,
        security_title: None,
        filing_date: filing_date.to_string(),
    }
}

// =============================================================================
// Read-through: Prices
// =============================================================================

#[test]
fn when_prices_are_requested_twice_the_provider_is_called_once() {
    // Given: An empty cache and a provider with unsorted bars
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        prices: vec![price("2024-01-03", 71.0), price("2024-01-02", 70.0)],
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);
    let range = DateRange::between("2024-01-01", "2024-01-31").expect("range");

    // When: The same window is requested twice
    let first = fetcher.prices("VNM", &range).expect("first");
    let second = fetcher.prices("VNM", &range).expect("second");

    // Then: Both answers are oldest-first and only the first went upstream
    assert_eq!(provider.calls.get(), 1);
    assert_eq!(first, second);
    assert_eq!(first[0].time, "2024-01-02");
    assert_eq!(cache.get_prices("VNM").map(|bars| bars.len()), Some(2));
}

#[test]
fn when_cached_prices_fall_outside_the_window_the_provider_is_asked() {
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        prices: vec![price("2024-03-01", 80.0)],
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);
    fetcher
        .prices("VNM", &DateRange::between("2024-03-01", "2024-03-31").expect("range"))
        .expect("seed");

    let february = DateRange::between("2024-02-01", "2024-02-29").expect("range");
    fetcher.prices("VNM", &february).expect("february");

    assert_eq!(provider.calls.get(), 2);
}

#[test]
fn when_provider_returns_nothing_nothing_is_cached() {
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider::default();
    let fetcher = CachedFetcher::new(&cache, &provider);

    let prices = fetcher
        .prices("VNM", &DateRange::until("2024-01-31").expect("range"))
        .expect("prices");

    assert!(prices.is_empty());
    assert!(cache.get_prices("VNM").is_none());
}

#[test]
fn when_provider_fails_the_error_is_surfaced() {
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        failure: Some(ProviderError::rate_limited("429 from upstream")),
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);

    let error = fetcher
        .company_news("VNM", &DateRange::until("2024-01-31").expect("range"), 10)
        .expect_err("provider failure");

    match error {
        FetchError::Provider(error) => assert!(error.retryable()),
        other => panic!("unexpected error {other:?}"),
    }
}

// =============================================================================
// Read-through: Fundamentals
// =============================================================================

#[test]
fn cached_metrics_are_served_newest_first_within_the_limit() {
    // Given: Three annual reports already fetched
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        metrics: vec![
            metrics("2021-12-31", "year", 12.0),
            metrics("2023-12-31", "year", 15.0),
            metrics("2022-12-31", "year", 14.0),
        ],
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);
    let end = IsoDate::parse("2023-12-31").expect("end");
    fetcher
        .financial_metrics("VNM", &end, ReportPeriod::Annual, 10)
        .expect("seed");

    // When: Two reports up to the end of 2022 are requested
    let cutoff = IsoDate::parse("2022-12-31").expect("cutoff");
    let served = fetcher
        .financial_metrics("VNM", &cutoff, ReportPeriod::Annual, 2)
        .expect("served");

    // Then: The cache answers with the newest qualifying reports
    assert_eq!(provider.calls.get(), 1);
    let periods: Vec<_> = served.iter().map(|m| m.report_period.as_str()).collect();
    assert_eq!(periods, ["2022-12-31", "2021-12-31"]);
}

#[test]
fn cached_reports_of_another_period_do_not_satisfy_the_request() {
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        metrics: vec![metrics("2023-09-30", "quarter", 13.0)],
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);
    let end = IsoDate::parse("2023-12-31").expect("end");

    fetcher
        .financial_metrics("VNM", &end, ReportPeriod::Quarterly, 4)
        .expect("quarterly");
    fetcher
        .financial_metrics("VNM", &end, ReportPeriod::Annual, 4)
        .expect("annual");

    assert_eq!(provider.calls.get(), 2);
}

#[test]
fn line_items_missing_a_requested_name_go_upstream() {
    // Given: Cached line items with revenue only
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        line_items: vec![LineItem {
            ticker: "FPT".to_string(),
            report_period: "2023-12-31".to_string(),
            period: "year".to_string(),
            currency: None,
            values: BTreeMap::from([("revenue".to_string(), Scalar::Integer(100))]),
        }],
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);
    let end = IsoDate::parse("2023-12-31").expect("end");
    let revenue = vec!["revenue".to_string()];
    fetcher
        .line_items("FPT", &revenue, &end, ReportPeriod::Annual, 4)
        .expect("seed");

    // When: Revenue is requested again, then revenue plus net income
    fetcher
        .line_items("FPT", &revenue, &end, ReportPeriod::Annual, 4)
        .expect("cached");
    assert_eq!(provider.calls.get(), 1);

    let both = vec!["revenue".to_string(), "net_income".to_string()];
    fetcher
        .line_items("FPT", &both, &end, ReportPeriod::Annual, 4)
        .expect("upstream");

    // Then: Only the uncovered request reached the provider
    assert_eq!(provider.calls.get(), 2);
}

// =============================================================================
// Read-through: Insider trades and news
// =============================================================================

#[test]
fn insider_trades_fall_back_to_filing_date_when_filtering() {
    // Given: One trade with a transaction date and one with only a filing date
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        trades: vec![
            trade("2024-01-20", Some("2024-01-05")),
            trade("2024-01-15", None),
        ],
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);
    let january = DateRange::between("2024-01-01", "2024-01-31").expect("range");
    fetcher.insider_trades("VNM", &january, 10).expect("seed");

    // When: Only the first ten days are requested
    let early = DateRange::between("2024-01-01", "2024-01-10").expect("range");
    let served = fetcher.insider_trades("VNM", &early, 10).expect("served");

    // Then: The cache matches on the transaction date
    assert_eq!(provider.calls.get(), 1);
    assert_eq!(served.len(), 1);
    assert_eq!(served[0].effective_date(), "2024-01-05");
}

#[test]
fn cached_news_is_newest_first_and_limited() {
    let (_temp, cache) = fresh_cache();
    let provider = FakeProvider {
        news: ["2024-01-02", "2024-01-09", "2024-01-05"]
            .into_iter()
            .map(|date| CompanyNews {
                ticker: "FPT".to_string(),
                title: format!("news on {date}"),
                author: None,
                source: None,
                date: date.to_string(),
                url: None,
                sentiment: None,
            })
            .collect(),
        ..FakeProvider::default()
    };
    let fetcher = CachedFetcher::new(&cache, &provider);
    let january = DateRange::until("2024-01-31").expect("range");
    fetcher.company_news("FPT", &january, 10).expect("seed");

    let served = fetcher.company_news("FPT", &january, 2).expect("served");

    assert_eq!(provider.calls.get(), 1);
    let dates: Vec<_> = served.iter().map(|news| news.date.as_str()).collect();
    assert_eq!(dates, ["2024-01-09", "2024-01-05"]);
}
