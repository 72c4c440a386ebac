mod cache;

use finx_cache::{CacheConfig, FinancialCache, LoadStatus};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

pub fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let config = cli.cache_config();

    match &cli.command {
        Command::Path => cache::path(&config),
        Command::Stats => {
            let (cache, status) = load(config)?;
            cache::stats(&cache, status)
        }
        Command::Show(args) => {
            let (cache, status) = load(config)?;
            cache::show(&cache, status, args)
        }
        // Clearing never reads the old snapshot, so an unreadable file can still be reset.
        Command::Clear => cache::clear(&FinancialCache::new(config)),
    }
}

fn load(config: CacheConfig) -> Result<(FinancialCache, LoadStatus), CliError> {
    let cache = FinancialCache::new(config);
    let status = cache.initialize()?;
    Ok((cache, status))
}
