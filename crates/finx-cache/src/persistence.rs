//! JSON snapshot of the whole entity store.
//!
//! The snapshot is a single object keyed by entity kind, each mapping symbols
//! to arrays of flat records. Writes go to a temporary file in the destination
//! directory which is then renamed over the snapshot, so readers only ever see
//! a complete document.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{CacheError, DeserializationError, PersistenceError};
use crate::store::{EntityStore, SymbolMap};
use crate::{CacheConfig, EntityKind};

/// Result of reading a snapshot from disk.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(EntityStore),
    NotFound,
}

/// Location of the durable snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.snapshot_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Serializes `store` and atomically replaces the snapshot with it.
    pub fn save(&self, store: &EntityStore) -> Result<(), PersistenceError> {
        let directory = self.directory();
        fs::create_dir_all(directory).map_err(|source| PersistenceError::CreateDir {
            path: directory.to_path_buf(),
            source,
        })?;

        let mut staged =
            NamedTempFile::new_in(directory).map_err(|source| self.write_error(source))?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, store.snapshot())?;
            writer.flush().map_err(|source| self.write_error(source))?;
        }
        staged
            .as_file()
            .sync_all()
            .map_err(|source| self.write_error(source))?;
        staged
            .persist(&self.path)
            .map_err(|error| self.write_error(error.error))?;

        debug!(path = %self.path.display(), "cache snapshot saved");
        Ok(())
    }

    /// Reads and validates the snapshot without touching any live store.
    pub fn load(&self) -> Result<LoadOutcome, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(LoadOutcome::NotFound)
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
        };

        let snapshot: BTreeMap<EntityKind, SymbolMap> =
            serde_json::from_slice(&bytes).map_err(|source| DeserializationError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        ensure_identity_keys(&snapshot)?;

        debug!(path = %self.path.display(), "cache snapshot loaded");
        Ok(LoadOutcome::Loaded(EntityStore::from_parts(snapshot)))
    }

    fn write_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

fn ensure_identity_keys(
    snapshot: &BTreeMap<EntityKind, SymbolMap>,
) -> Result<(), DeserializationError> {
    for (kind, symbols) in snapshot {
        let key = kind.identity_key();
        for (symbol, collection) in symbols {
            if let Some(index) = collection
                .iter()
                .position(|record| record.identity(key).is_none())
            {
                return Err(DeserializationError::MissingIdentityKey {
                    kind: *kind,
                    symbol: symbol.clone(),
                    index,
                    key,
                });
            }
        }
    }
    Ok(())
}
