use std::path::PathBuf;

use thiserror::Error;

use crate::EntityKind;

/// Record and argument validation errors raised before any state changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,

    #[error("record {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index}: field '{field}' cannot be coerced to {expected}: {found}")]
    InvalidField {
        index: usize,
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("record {index}: field '{field}' must be finite")]
    NonFiniteValue { index: usize, field: &'static str },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("invalid entity kind '{value}', expected one of prices, financial_metrics, line_items, insider_trades, company_news")]
    InvalidEntityKind { value: String },

    #[error("record contains a nested value in field '{field}'; only scalars are cached")]
    NonScalarField { field: String },

    #[error("value is not a flat record object: {reason}")]
    NotARecord { reason: String },
}

/// Which side of a merge a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSide {
    Existing,
    Incoming,
}

impl BatchSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Incoming => "incoming",
        }
    }
}

/// A merge input violated the identity-key contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{} record {position} has no value for identity key '{key}'", side.as_str())]
pub struct PreconditionError {
    pub key: &'static str,
    pub side: BatchSide,
    pub position: usize,
}

/// Filesystem failures while reading or writing the snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The snapshot exists but cannot be adopted.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("snapshot {path} is not a valid cache document: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot {kind} entry for '{symbol}' has record {index} without identity key '{key}'")]
    MissingIdentityKey {
        kind: EntityKind,
        symbol: String,
        index: usize,
        key: &'static str,
    },
}

/// Top-level error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
}
