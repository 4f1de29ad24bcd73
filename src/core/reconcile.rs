//! Search-result to record reconciliation.
//!
//! Maps the identifiers returned by a search query back to hydrated
//! records with one bulk fetch, optionally restoring the backend's
//! relevance order in process (no store-specific ordering clause).

use crate::core::error::{BridgeError, Result};
use crate::core::types::{DocId, Record};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A fetched item that can be correlated with a search identifier
pub trait Keyed {
    /// Value of the lookup column as a search identifier.
    ///
    /// A missing or non-integer value is a mapping problem, reported
    /// as [`BridgeError::ConfigError`].
    fn key(&self, column: &str) -> Result<DocId>;
}

impl Keyed for Record {
    fn key(&self, column: &str) -> Result<DocId> {
        match self.get(column) {
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
                BridgeError::ConfigError(format!(
                    "Lookup column '{column}' holds {n}, expected an unsigned integer id"
                ))
            }),
            Some(other) => Err(BridgeError::ConfigError(format!(
                "Lookup column '{column}' holds a non-integer value ({other}); \
                 check the index mapping"
            ))),
            None => Err(BridgeError::ConfigError(format!(
                "Lookup column '{column}' is missing from fetched records"
            ))),
        }
    }
}

/// Unique identifiers in first-seen order
pub fn unique_ids(matches: &[DocId]) -> Vec<DocId> {
    let mut seen = HashSet::with_capacity(matches.len());
    matches.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Hydrate search matches into records.
///
/// `fetch` is called exactly once with the unique identifiers, and
/// not at all when `matches` is empty. With `preserve_order` the
/// output follows `matches` (duplicates repeat, missing records are
/// skipped); otherwise the fetched collection is returned as-is.
pub fn reconcile<R, F>(
    matches: &[DocId],
    column: &str,
    fetch: F,
    preserve_order: bool,
) -> Result<Vec<R>>
where
    R: Keyed + Clone,
    F: FnOnce(&[DocId]) -> Result<Vec<R>>,
{
    if matches.is_empty() {
        return Ok(Vec::new());
    }

    let ids = unique_ids(matches);
    let fetched = fetch(&ids).map_err(into_store_error)?;

    tracing::debug!(
        "Fetched {} record(s) for {} unique id(s)",
        fetched.len(),
        ids.len()
    );

    if !preserve_order {
        return Ok(fetched);
    }

    let mut by_id: HashMap<DocId, usize> = HashMap::with_capacity(fetched.len());
    for (pos, record) in fetched.iter().enumerate() {
        // First record wins if the store returns the same key twice
        by_id.entry(record.key(column)?).or_insert(pos);
    }

    let ordered = matches
        .iter()
        .filter_map(|id| by_id.get(id).map(|&pos| fetched[pos].clone()))
        .collect::<Vec<_>>();

    if ordered.len() < matches.len() {
        tracing::debug!(
            "{} matched id(s) have no record in the store",
            matches.len() - ordered.len()
        );
    }

    Ok(ordered)
}

fn into_store_error(err: BridgeError) -> BridgeError {
    match err {
        e @ (BridgeError::StoreUnavailable(_) | BridgeError::ConfigError(_)) => e,
        other => BridgeError::StoreUnavailable(other.to_string()),
    }
}
