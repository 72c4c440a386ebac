use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the snapshot location.
pub const CACHE_PATH_ENV: &str = "FINANCIAL_CACHE_PATH";

const DEFAULT_CACHE_DIR: &str = ".cache";
const DEFAULT_SNAPSHOT_FILE: &str = "financial_data_cache.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub snapshot_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_path: resolve_snapshot_path(env::var_os(CACHE_PATH_ENV).map(PathBuf::from)),
        }
    }
}

impl CacheConfig {
    pub fn at(snapshot_path: impl AsRef<Path>) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }
}

fn resolve_snapshot_path(override_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = override_path {
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    PathBuf::from(DEFAULT_CACHE_DIR).join(DEFAULT_SNAPSHOT_FILE)
}
