//! CLI argument definitions for the cache inspector.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `path` | Print the resolved snapshot location |
//! | `stats` | Symbol and record counts per entity kind |
//! | `show` | Print the cached collection for one kind and symbol |
//! | `clear` | Drop every cached collection |
//!
//! # Examples
//!
//! ```bash
//! finx-cache stats --format table
//! finx-cache show prices VNM --pretty
//! FINANCIAL_CACHE_PATH=/tmp/cache.json finx-cache clear
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use finx_cache::{CacheConfig, EntityKind, CACHE_PATH_ENV};

/// Inspect and manage the local financial data cache.
#[derive(Debug, Parser)]
#[command(name = "finx-cache", author, version, about = "Inspect the finx data cache")]
pub struct Cli {
    /// Snapshot file to operate on.
    #[arg(long, global = true, env = CACHE_PATH_ENV)]
    pub cache_path: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn cache_config(&self) -> CacheConfig {
        match &self.cache_path {
            Some(path) if !path.as_os_str().is_empty() => CacheConfig::at(path),
            _ => CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON document.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the snapshot path in use.
    Path,

    /// Show symbol and record counts for every entity kind.
    Stats,

    /// Print the cached records for one kind and symbol.
    ///
    ///   finx-cache show prices VNM
    ///   finx-cache show line-items FPT --format table
    Show(ShowArgs),

    /// Remove every cached collection and persist the empty cache.
    Clear,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Entity kind (prices, financial_metrics, line_items, insider_trades, company_news).
    #[arg(value_parser = parse_kind)]
    pub kind: EntityKind,

    /// Ticker symbol.
    pub symbol: String,
}

fn parse_kind(value: &str) -> Result<EntityKind, String> {
    value.parse().map_err(|error: finx_cache::ValidationError| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_parses_kind_aliases() {
        let cli = Cli::try_parse_from(["finx-cache", "show", "line-items", "FPT"]).expect("parse");
        match cli.command {
            Command::Show(args) => {
                assert_eq!(args.kind, EntityKind::LineItems);
                assert_eq!(args.symbol, "FPT");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["finx-cache", "show", "quotes", "FPT"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "finx-cache",
            "stats",
            "--format",
            "table",
            "--cache-path",
            "/tmp/finx/cache.json",
        ])
        .expect("parse");

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(
            cli.cache_config().snapshot_path,
            PathBuf::from("/tmp/finx/cache.json")
        );
    }
}
