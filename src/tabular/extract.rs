//! Fuzzy, header-relative record extraction.
//!
//! Columns are never addressed by fixed index: every field is declared as an
//! ordered list of acceptable label fragments, resolved against the header of
//! the block being read. Adding support for a new sheet layout is a data
//! change to the field map, not a code change.

use std::collections::HashMap;

use crate::tabular::headers::find_col;
use crate::tabular::normalize::{is_numeric_cell, parse_amount};

/// Canonical field name → ordered label fragments. The first fragment that
/// matches any header cell wins, scanning fragments in declaration order.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    entries: Vec<(&'static str, Vec<&'static str>)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, fragments: &[&'static str]) -> Self {
        self.entries.push((name, fragments.to_vec()));
        self
    }

    /// Resolves every field against a concrete header row. Unmatched fields
    /// resolve to `None`; extraction then yields empty strings for them.
    pub fn resolve(&self, header: &[String]) -> ResolvedColumns {
        let columns = self
            .entries
            .iter()
            .map(|(name, fragments)| {
                let idx = fragments.iter().find_map(|fragment| find_col(header, fragment));
                (*name, idx)
            })
            .collect();
        ResolvedColumns { columns }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

/// Field → column index for one header block. Lookup is re-done per block;
/// layouts can differ block to block within the same sheet.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    columns: HashMap<&'static str, Option<usize>>,
}

impl ResolvedColumns {
    pub fn column(&self, field: &str) -> Option<usize> {
        self.columns.get(field).copied().flatten()
    }

    /// True when every listed field found a column.
    pub fn has_all(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.column(f).is_some())
    }

    /// Names of the listed fields that did not resolve, for error messages.
    pub fn missing(&self, fields: &[&str]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| self.column(f).is_none())
            .map(|f| f.to_string())
            .collect()
    }
}

/// One extracted data row: every mapped field is present, possibly empty.
#[derive(Debug, Clone)]
pub struct ExtractedRow {
    /// Index of the row within the source grid.
    pub source_row: usize,
    values: HashMap<&'static str, String>,
}

impl ExtractedRow {
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn amount(&self, field: &str) -> f64 {
        parse_amount(self.get(field))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Skip rows whose first cell does not parse as a number. The registry
    /// uses a numeric row index in the first column; separator rows and
    /// sub-total annotations fail the check.
    pub require_numeric_index: bool,
}

/// Extracts structured rows from one header block.
///
/// Fully-empty rows are skipped. A mapped field whose column is missing or
/// out of range for a given row yields an empty string, never a failure;
/// source data is manually maintained and expected to be ragged.
pub fn extract_rows(
    header: &[String],
    data: &[Vec<String>],
    data_offset: usize,
    map: &FieldMap,
    options: ExtractOptions,
) -> Vec<ExtractedRow> {
    let resolved = map.resolve(header);
    let mut rows = Vec::new();

    for (offset, row) in data.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if options.require_numeric_index {
            let first = row.first().map(String::as_str).unwrap_or("");
            if !is_numeric_cell(first) {
                crate::observability::metrics::extract::row_skipped();
                continue;
            }
        }

        let values = map
            .field_names()
            .map(|name| {
                let value = resolved
                    .column(name)
                    .and_then(|idx| row.get(idx))
                    .map(|cell| cell.trim().to_string())
                    .unwrap_or_default();
                (name, value)
            })
            .collect();

        rows.push(ExtractedRow { source_row: data_offset + offset, values });
    }

    crate::observability::metrics::extract::rows_extracted(rows.len());
    rows
}
