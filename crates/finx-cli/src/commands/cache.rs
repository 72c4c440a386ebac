use finx_cache::{CacheConfig, Durability, FinancialCache, LoadStatus};
use serde_json::json;

use crate::cli::ShowArgs;
use crate::error::CliError;

use super::CommandResult;

const NO_SNAPSHOT_WARNING: &str = "no cache snapshot found; showing an empty cache";

pub fn path(config: &CacheConfig) -> Result<CommandResult, CliError> {
    Ok(CommandResult::ok(json!({
        "path": config.snapshot_path.display().to_string(),
        "exists": config.snapshot_path.is_file(),
    })))
}

pub fn stats(cache: &FinancialCache, status: LoadStatus) -> Result<CommandResult, CliError> {
    let result = CommandResult::ok(serde_json::to_value(cache.stats())?);
    Ok(with_load_warning(result, status))
}

pub fn show(
    cache: &FinancialCache,
    status: LoadStatus,
    args: &ShowArgs,
) -> Result<CommandResult, CliError> {
    let symbol = args.symbol.trim();
    if symbol.is_empty() {
        return Err(finx_cache::ValidationError::EmptySymbol.into());
    }

    let records = cache.get(args.kind, symbol);
    let cached = records.is_some();
    let mut result = CommandResult::ok(json!({
        "kind": args.kind,
        "symbol": symbol,
        "cached": cached,
        "records": records,
    }));
    if !cached {
        result = result.with_warning(format!("{symbol} has no cached {}", args.kind));
    }
    Ok(with_load_warning(result, status))
}

pub fn clear(cache: &FinancialCache) -> Result<CommandResult, CliError> {
    let durability = cache.clear();
    let mut result = CommandResult::ok(json!({
        "path": cache.snapshot_path().display().to_string(),
        "persisted": durability == Durability::Persisted,
    }));
    if durability == Durability::InMemoryOnly {
        result = result
            .with_warning("cache cleared in memory but the snapshot could not be written");
    }
    Ok(result)
}

fn with_load_warning(result: CommandResult, status: LoadStatus) -> CommandResult {
    match status {
        LoadStatus::Loaded => result,
        LoadStatus::NotFound => result.with_warning(NO_SNAPSHOT_WARNING),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finx_cache::{EntityKind, Record};
    use tempfile::tempdir;

    fn seeded(path: &std::path::Path) -> FinancialCache {
        let cache = FinancialCache::new(CacheConfig::at(path));
        let news: Vec<Record> =
            serde_json::from_value(json!([{"date": "2024-01-02", "title": "results"}]))
                .expect("records");
        cache.set_company_news("FPT", news).expect("seed");
        cache
    }

    #[test]
    fn show_reports_cached_records() {
        let temp = tempdir().expect("tempdir");
        let cache = seeded(&temp.path().join("cache.json"));
        let args = ShowArgs {
            kind: EntityKind::CompanyNews,
            symbol: String::from(" FPT "),
        };

        let result = show(&cache, LoadStatus::Loaded, &args).expect("show");

        assert_eq!(result.data["cached"], json!(true));
        assert_eq!(result.data["records"][0]["title"], json!("results"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn show_warns_when_symbol_is_not_cached() {
        let temp = tempdir().expect("tempdir");
        let cache = seeded(&temp.path().join("cache.json"));
        let args = ShowArgs {
            kind: EntityKind::Prices,
            symbol: String::from("FPT"),
        };

        let result = show(&cache, LoadStatus::Loaded, &args).expect("show");

        assert_eq!(result.data["records"], json!(null));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn clear_persists_empty_snapshot() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("cache.json");
        let cache = seeded(&path);

        let result = clear(&cache).expect("clear");

        assert_eq!(result.data["persisted"], json!(true));
        let reopened = FinancialCache::new(CacheConfig::at(&path));
        assert_eq!(reopened.initialize().expect("load"), LoadStatus::Loaded);
        assert!(reopened.get_company_news("FPT").is_none());
    }
}
