//! Order-deterministic aggregation of per-row records by company key.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::CompanyRecord;
use crate::observability::metrics;

/// Merges records sharing a key, strictly in input order.
///
/// Callers are responsible for feeding sources in their documented order
/// (historic before incremental); the "last non-empty wins" string fields
/// make that order observable in the output. Output preserves first-seen key
/// order, so the same input always produces the same table. Records with an
/// empty key cannot be joined and are dropped.
pub fn aggregate(records: impl IntoIterator<Item = (String, CompanyRecord)>) -> Vec<CompanyRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, CompanyRecord> = HashMap::new();

    for (key, record) in records {
        if key.trim().is_empty() {
            metrics::aggregate::empty_key_dropped();
            continue;
        }
        match merged.get_mut(&key) {
            Some(existing) => existing.merge_from(&record),
            None => {
                order.push(key.clone());
                merged.insert(key, record);
            }
        }
    }

    metrics::aggregate::records_merged(order.len());
    debug!(companies = order.len(), "aggregation complete");
    order
        .into_iter()
        .map(|key| merged.remove(&key).expect("key tracked in order"))
        .collect()
}
