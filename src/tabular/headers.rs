//! Header row detection for sheets that were never designed as tables.
//!
//! The master registry is a single physical sheet holding several
//! independently-headed regions (the legacy operators split it when it grew
//! past one screen). A header row is recognized by content, not position:
//! every required label fragment must appear somewhere in the row.

use crate::tabular::normalize::normalize_label;

/// One contiguous region of a sheet governed by a single header row.
/// `data_end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBlock {
    pub header_row: usize,
    pub data_start: usize,
    pub data_end: usize,
}

/// Returns the index of the first cell whose normalized label contains the
/// normalized `fragment` as a substring.
pub fn find_col(header: &[String], fragment: &str) -> Option<usize> {
    let target = normalize_label(fragment);
    if target.is_empty() {
        return None;
    }
    header
        .iter()
        .position(|cell| normalize_label(cell).contains(&target))
}

/// Scans the whole grid for rows where every required fragment matches some
/// cell. Result is deduplicated and ascending.
pub fn find_header_rows(rows: &[Vec<String>], required_fragments: &[&str]) -> Vec<usize> {
    let mut indices: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            !row.is_empty()
                && required_fragments
                    .iter()
                    .all(|fragment| find_col(row, fragment).is_some())
        })
        .map(|(idx, _)| idx)
        .collect();
    indices.dedup();
    indices
}

/// Segments the grid into header blocks: each detected header row governs
/// the rows up to the next header, or to the end of the sheet for the last.
pub fn header_blocks(rows: &[Vec<String>], required_fragments: &[&str]) -> Vec<HeaderBlock> {
    let header_rows = find_header_rows(rows, required_fragments);
    header_rows
        .iter()
        .enumerate()
        .map(|(i, &header_row)| HeaderBlock {
            header_row,
            data_start: header_row + 1,
            data_end: header_rows.get(i + 1).copied().unwrap_or(rows.len()),
        })
        .collect()
}
