use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// The fixed categories of cached provider data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Prices,
    FinancialMetrics,
    LineItems,
    InsiderTrades,
    CompanyNews,
}

impl EntityKind {
    pub const ALL: [Self; 5] = [
        Self::Prices,
        Self::FinancialMetrics,
        Self::LineItems,
        Self::InsiderTrades,
        Self::CompanyNews,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prices => "prices",
            Self::FinancialMetrics => "financial_metrics",
            Self::LineItems => "line_items",
            Self::InsiderTrades => "insider_trades",
            Self::CompanyNews => "company_news",
        }
    }

    /// Field whose value distinguishes records within one symbol's collection.
    pub const fn identity_key(self) -> &'static str {
        match self {
            Self::Prices => "time",
            Self::FinancialMetrics | Self::LineItems => "report_period",
            Self::InsiderTrades => "filing_date",
            Self::CompanyNews => "date",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "prices" => Ok(Self::Prices),
            "financial_metrics" => Ok(Self::FinancialMetrics),
            "line_items" => Ok(Self::LineItems),
            "insider_trades" => Ok(Self::InsiderTrades),
            "company_news" => Ok(Self::CompanyNews),
            other => Err(ValidationError::InvalidEntityKind {
                value: other.to_owned(),
            }),
        }
    }
}
