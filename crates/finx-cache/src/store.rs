use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::Collection;
use crate::EntityKind;

/// Symbol → collection mapping for one entity kind.
pub type SymbolMap = BTreeMap<String, Collection>;

/// In-memory kind → symbol → collection container.
///
/// Performs no validation or I/O; callers go through
/// [`FinancialCache`](crate::FinancialCache) to keep collections deduplicated
/// and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStore {
    kinds: BTreeMap<EntityKind, SymbolMap>,
}

/// Per-kind counts reported by [`EntityStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindStats {
    pub kind: EntityKind,
    pub symbols: usize,
    pub records: usize,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            kinds: EntityKind::ALL
                .into_iter()
                .map(|kind| (kind, SymbolMap::new()))
                .collect(),
        }
    }

    pub(crate) fn from_parts(parts: impl IntoIterator<Item = (EntityKind, SymbolMap)>) -> Self {
        let mut store = Self::new();
        for (kind, symbols) in parts {
            store.kinds.insert(kind, symbols);
        }
        store
    }

    pub fn get_collection(&self, kind: EntityKind, symbol: &str) -> Option<&Collection> {
        self.kinds.get(&kind).and_then(|symbols| symbols.get(symbol))
    }

    pub fn put_collection(
        &mut self,
        kind: EntityKind,
        symbol: impl Into<String>,
        collection: Collection,
    ) {
        self.kinds
            .entry(kind)
            .or_default()
            .insert(symbol.into(), collection);
    }

    pub fn clear_all(&mut self) {
        for symbols in self.kinds.values_mut() {
            symbols.clear();
        }
    }

    pub fn symbols(&self, kind: EntityKind) -> Vec<&str> {
        self.kinds
            .get(&kind)
            .map(|symbols| symbols.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub(crate) fn snapshot(&self) -> &BTreeMap<EntityKind, SymbolMap> {
        &self.kinds
    }

    pub fn stats(&self) -> Vec<KindStats> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let symbols = self.kinds.get(&kind);
                KindStats {
                    kind,
                    symbols: symbols.map_or(0, BTreeMap::len),
                    records: symbols.map_or(0, |symbols| symbols.values().map(Vec::len).sum()),
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(BTreeMap::is_empty)
    }
}
