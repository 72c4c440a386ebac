use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] finx_cache::ValidationError),

    #[error(transparent)]
    Cache(#[from] finx_cache::CacheError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Cache(finx_cache::CacheError::Validation(_)) => 2,
            Self::Cache(_) | Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
