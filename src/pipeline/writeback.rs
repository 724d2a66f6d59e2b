//! Writes reconciled per-year tier codes back into the master registry grid.
//!
//! For every year present in the reconciled histories, each registry block
//! gets a `T<year>` column (appended to its header when absent) filled with
//! the numeric tier code for that company and year. The input grid is never
//! mutated; the caller receives an updated copy to publish in one shot.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{SizeTier, TierRecords};
use crate::tabular::headers::{find_col, header_blocks};
use crate::tabular::normalize::normalize_ruc;
use crate::tabular::Sheet;

/// Registry blocks are recognized the same way the size jobs find them.
const REGISTRY_HEADER_FRAGMENTS: [&str; 2] = ["RUC", "TAMANO"];

/// Converts a tier label to its registry code; unknown labels become empty
/// cells rather than junk codes.
fn tier_code(label: &str) -> &'static str {
    SizeTier::parse(label).map(|t| t.code()).unwrap_or("")
}

/// Returns a copy of the registry grid with `T<year>` code columns filled in
/// for every block. Rows whose RUC is not in `records` are left untouched.
pub fn write_size_codes(master: &Sheet, records: &TierRecords) -> Sheet {
    let mut rows = master.rows.clone();

    let years: BTreeSet<i32> = records
        .values()
        .flat_map(|history| history.keys().copied())
        .collect();
    if years.is_empty() {
        return Sheet::new(master.name.clone(), rows);
    }

    let blocks = header_blocks(&rows, &REGISTRY_HEADER_FRAGMENTS);
    for block in blocks {
        let Some(ruc_col) = find_col(&rows[block.header_row], "RUC") else {
            continue;
        };

        // Locate or append one code column per year in this block's header.
        let mut year_cols: Vec<(i32, usize)> = Vec::new();
        for &year in &years {
            let label = format!("T{}", year);
            let col = match find_col(&rows[block.header_row], &label) {
                Some(idx) => idx,
                None => {
                    rows[block.header_row].push(label);
                    rows[block.header_row].len() - 1
                }
            };
            year_cols.push((year, col));
        }
        let header_width = rows[block.header_row].len();

        let data_end = block.data_end.min(rows.len());
        for row_idx in block.data_start..data_end {
            let row = &mut rows[row_idx];
            let ruc = normalize_ruc(row.get(ruc_col).map(String::as_str).unwrap_or(""));
            let Some(history) = records.get(&ruc) else {
                continue;
            };
            if row.len() < header_width {
                row.resize(header_width, String::new());
            }
            for &(year, col) in &year_cols {
                if let Some(tier) = history.get(&year) {
                    row[col] = tier_code(tier).to_string();
                }
            }
        }
    }

    debug!(years = years.len(), "size codes written back to registry grid");
    Sheet::new(master.name.clone(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            "BASE DE DATOS",
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn records() -> TierRecords {
        let mut records = TierRecords::new();
        let mut history = BTreeMap::new();
        history.insert(2022, "MICRO".to_string());
        history.insert(2023, "PEQUENA".to_string());
        records.insert("991".to_string(), history);
        records
    }

    #[test]
    fn appends_code_columns_and_fills_known_rucs() {
        let master = sheet(&[
            &["N", "RUC", "TAMANO"],
            &["1", "0991", "MICRO"],
            &["2", "0881", "GRANDE"],
        ]);
        let updated = write_size_codes(&master, &records());

        assert_eq!(updated.rows[0], vec!["N", "RUC", "TAMANO", "T2022", "T2023"]);
        assert_eq!(updated.rows[1], vec!["1", "0991", "MICRO", "1", "2"]);
        // Unknown RUC: row untouched, not even extended
        assert_eq!(updated.rows[2], vec!["2", "0881", "GRANDE"]);
        // Input grid unchanged
        assert_eq!(master.rows[0].len(), 3);
    }

    #[test]
    fn reuses_existing_code_columns() {
        let master = sheet(&[
            &["N", "RUC", "TAMANO", "T2022"],
            &["1", "991", "MICRO", "4"],
        ]);
        let updated = write_size_codes(&master, &records());
        assert_eq!(updated.rows[0], vec!["N", "RUC", "TAMANO", "T2022", "T2023"]);
        assert_eq!(updated.rows[1][3], "1");
    }

    #[test]
    fn both_blocks_are_updated() {
        let master = sheet(&[
            &["N", "RUC", "TAMANO"],
            &["1", "991", "MICRO"],
            &["TAMANO", "RUC"],
            &["PEQUENA", "991"],
        ]);
        let updated = write_size_codes(&master, &records());
        assert_eq!(updated.rows[1][3], "1");
        assert_eq!(updated.rows[3][2], "1");
        assert_eq!(updated.rows[3][3], "2");
    }

    #[test]
    fn unknown_tier_labels_write_empty_codes() {
        let mut recs = TierRecords::new();
        let mut history = BTreeMap::new();
        history.insert(2022, "DESCONOCIDO".to_string());
        recs.insert("991".to_string(), history);

        let master = sheet(&[&["N", "RUC", "TAMANO"], &["1", "991", ""]]);
        let updated = write_size_codes(&master, &recs);
        assert_eq!(updated.rows[1][3], "");
    }
}
