//! Stage counters for the reconciliation pipeline.
//!
//! Thin helper functions over the `metrics` facade so call sites stay free of
//! magic strings. Whether anything collects the values depends on the
//! recorder installed by the embedding process; with none installed the
//! calls are no-ops.

/// Extraction stage: rows pulled out of raw grids.
pub mod extract {
    pub fn rows_extracted(count: usize) {
        ::metrics::counter!("padron_extract_rows_total").increment(count as u64);
    }

    pub fn row_skipped() {
        ::metrics::counter!("padron_extract_rows_skipped_total").increment(1);
    }
}

/// Identity resolution stage.
pub mod identity {
    pub fn resolved_by_ruc() {
        ::metrics::counter!("padron_identity_resolved_by_ruc_total").increment(1);
    }

    pub fn resolved_by_name() {
        ::metrics::counter!("padron_identity_resolved_by_name_total").increment(1);
    }

    pub fn unresolved() {
        ::metrics::counter!("padron_identity_unresolved_total").increment(1);
    }
}

/// Aggregation stage.
pub mod aggregate {
    pub fn records_merged(count: usize) {
        ::metrics::counter!("padron_aggregate_records_total").increment(count as u64);
    }

    pub fn empty_key_dropped() {
        ::metrics::counter!("padron_aggregate_empty_keys_total").increment(1);
    }
}

/// Transition detection stage.
pub mod transitions {
    pub fn detected(count: usize) {
        ::metrics::counter!("padron_transitions_detected_total").increment(count as u64);
    }
}

/// Output publication.
pub mod publish {
    pub fn table_written(rows: usize) {
        ::metrics::counter!("padron_publish_tables_total").increment(1);
        ::metrics::counter!("padron_publish_rows_total").increment(rows as u64);
    }
}
