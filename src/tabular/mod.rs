//! Raw tabular model and the pure functions that make sense of it.

pub mod extract;
pub mod headers;
pub mod normalize;

use serde::{Deserialize, Serialize};

/// A named 2D cell grid, exactly as the workbook hands it over: untyped
/// strings, ragged row widths, no guaranteed header position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self { name: name.into(), rows }
    }

    /// Cells of the block's header row; empty slice when out of range.
    pub fn header(&self, block: headers::HeaderBlock) -> &[String] {
        self.rows
            .get(block.header_row)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Data rows governed by the block.
    pub fn data(&self, block: headers::HeaderBlock) -> &[Vec<String>] {
        let end = block.data_end.min(self.rows.len());
        let start = block.data_start.min(end);
        &self.rows[start..end]
    }
}
