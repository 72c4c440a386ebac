//! Identity-keyed merge of a freshly fetched batch into a cached collection.

use std::collections::{HashMap, HashSet};

use crate::error::{BatchSide, PreconditionError};
use crate::record::{Collection, IdentityValue, Record};

/// Merges `incoming` into `existing`, matching records by `identity_key`.
///
/// Output order is every kept incoming record first (overlaid on its existing
/// counterpart when one exists), followed by the existing records whose key
/// did not appear in `incoming`, in their original order. Nothing is sorted.
///
/// When `incoming` holds several records with the same key value, the last
/// occurrence wins and the earlier ones are dropped. The result therefore
/// never contains two records with the same key, and merging the same batch
/// twice yields the same collection as merging it once.
///
/// Every record on both sides must carry a non-null value for
/// `identity_key`; the first one that does not is reported and nothing is
/// merged.
pub fn merge(
    existing: Option<&[Record]>,
    incoming: Vec<Record>,
    identity_key: &'static str,
) -> Result<Collection, PreconditionError> {
    let existing = existing.unwrap_or_default();
    let existing_keys = identities(existing, identity_key, BatchSide::Existing)?;
    let incoming_keys = identities(&incoming, identity_key, BatchSide::Incoming)?;

    let mut last_position = HashMap::with_capacity(incoming_keys.len());
    for (position, key) in incoming_keys.iter().enumerate() {
        last_position.insert(key, position);
    }

    let kept = incoming
        .into_iter()
        .zip(incoming_keys.iter())
        .enumerate()
        .filter(|(position, (_, key))| last_position.get(key) == Some(position))
        .map(|(_, pair)| pair);

    if existing.is_empty() {
        return Ok(kept.map(|(record, _)| record).collect());
    }

    let mut by_key: HashMap<&IdentityValue, &Record> = HashMap::with_capacity(existing.len());
    for (record, key) in existing.iter().zip(existing_keys.iter()) {
        by_key.insert(key, record);
    }

    let mut merged = Vec::with_capacity(existing.len() + last_position.len());
    for (record, key) in kept {
        match by_key.get(key) {
            Some(current) => merged.push(current.overlaid_with(&record)),
            None => merged.push(record),
        }
    }

    let mut emitted: HashSet<&IdentityValue> = last_position.keys().copied().collect();
    for key in &existing_keys {
        if emitted.insert(key) {
            if let Some(record) = by_key.get(key) {
                merged.push((*record).clone());
            }
        }
    }

    Ok(merged)
}

fn identities(
    records: &[Record],
    identity_key: &'static str,
    side: BatchSide,
) -> Result<Vec<IdentityValue>, PreconditionError> {
    records
        .iter()
        .enumerate()
        .map(|(position, record)| {
            record.identity(identity_key).ok_or(PreconditionError {
                key: identity_key,
                side,
                position,
            })
        })
        .collect()
}
