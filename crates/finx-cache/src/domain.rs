//! Typed records returned by upstream providers.
//!
//! These are flattened into [`Record`](crate::Record)s before caching and
//! rebuilt from them when served from the cache.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::Date;

use crate::record::Scalar;
use crate::ValidationError;

/// Daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub time: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub ticker: String,
    pub report_period: String,
    pub period: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Ratio and valuation fields keyed by metric name.
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub ticker: String,
    pub report_period: String,
    pub period: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Scalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTrade {
    pub ticker: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_board_director: Option<bool>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub transaction_shares: Option<f64>,
    #[serde(default)]
    pub transaction_price_per_share: Option<f64>,
    #[serde(default)]
    pub transaction_value: Option<f64>,
    #[serde(default)]
    pub shares_owned_before_transaction: Option<f64>,
    #[serde(default)]
    pub shares_owned_after_transaction: Option<f64>,
    #[serde(default)]
    pub security_title: Option<String>,
    pub filing_date: String,
}

impl InsiderTrade {
    /// Transaction date when known, otherwise the filing date.
    pub fn effective_date(&self) -> &str {
        self.transaction_date
            .as_deref()
            .unwrap_or(self.filing_date.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyNews {
    pub ticker: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub date: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

/// Reporting cadence requested from fundamentals endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportPeriod {
    #[default]
    #[serde(rename = "year")]
    Annual,
    #[serde(rename = "quarter")]
    Quarterly,
    #[serde(rename = "ttm")]
    Ttm,
}

impl ReportPeriod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Annual => "year",
            Self::Quarterly => "quarter",
            Self::Ttm => "ttm",
        }
    }
}

impl Display for ReportPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "year" | "annual" => Ok(Self::Annual),
            "quarter" | "quarterly" => Ok(Self::Quarterly),
            "ttm" => Ok(Self::Ttm),
            other => Err(ValidationError::InvalidField {
                index: 0,
                field: "period",
                expected: "one of year, quarter, ttm",
                found: other.to_owned(),
            }),
        }
    }
}

/// Calendar date in `YYYY-MM-DD` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDate(String);

impl IsoDate {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        Date::parse(trimmed, format_description!("[year]-[month]-[day]")).map_err(|_| {
            ValidationError::InvalidDate {
                value: value.to_owned(),
            }
        })?;
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compares a cached date or timestamp by its calendar-date prefix.
    pub fn is_on_or_after(&self, value: &str) -> bool {
        date_prefix(value) >= self.0.as_str()
    }

    pub fn is_on_or_before(&self, value: &str) -> bool {
        date_prefix(value) <= self.0.as_str()
    }
}

impl Display for IsoDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn date_prefix(value: &str) -> &str {
    value.get(..10).unwrap_or(value)
}

/// Inclusive date window; an absent start is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    start: Option<IsoDate>,
    end: IsoDate,
}

impl DateRange {
    pub fn new(start: Option<&str>, end: &str) -> Result<Self, ValidationError> {
        let end = IsoDate::parse(end)?;
        let start = start.map(IsoDate::parse).transpose()?;
        if let Some(start) = &start {
            if start > &end {
                return Err(ValidationError::InvertedDateRange {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }
        Ok(Self { start, end })
    }

    pub fn between(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(Some(start), end)
    }

    pub fn until(end: &str) -> Result<Self, ValidationError> {
        Self::new(None, end)
    }

    pub fn start(&self) -> Option<&IsoDate> {
        self.start.as_ref()
    }

    pub fn end(&self) -> &IsoDate {
        &self.end
    }

    pub fn contains(&self, value: &str) -> bool {
        self.start
            .as_ref()
            .is_none_or(|start| start.is_on_or_after(value))
            && self.end.is_on_or_before(value)
    }
}
