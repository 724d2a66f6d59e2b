//! Manager-gender share per size tier, joined against the current-tier
//! snapshot. A small report the association publishes alongside the size
//! reconciliation.

use std::collections::HashMap;

use tracing::info;

use crate::domain::SizeTier;
use crate::error::{Result, SyncError};
use crate::tabular::extract::{extract_rows, ExtractOptions, FieldMap};
use crate::tabular::headers::header_blocks;
use crate::tabular::normalize::{normalize_label, normalize_ruc};
use crate::tabular::Sheet;

#[derive(Debug, Clone, PartialEq)]
pub struct GenderSummaryRow {
    pub tamano: String,
    pub femenino: usize,
    pub masculino: usize,
    pub total: usize,
    pub pct_femenino: f64,
    pub pct_masculino: f64,
}

const GENDER_HEADER_FRAGMENTS: [&str; 2] = ["RUC", "GENERO"];

/// Canonicalizes the free-text gender cell. Abbreviations and gender
/// inflections collapse to the two report categories; junk becomes empty
/// and the row is excluded from the counts.
fn normalize_gender(raw: &str) -> String {
    match normalize_label(raw).as_str() {
        "F" | "FEMENINO" | "FEMENINA" => "FEMENINO".to_string(),
        "M" | "MASCULINO" | "MASCULINA" => "MASCULINO".to_string(),
        "" | "NAN" | "NONE" | "NA" | "0" => String::new(),
        other => other.to_string(),
    }
}

/// Counts managers by gender within each tier, in ladder order. Companies
/// absent from the snapshot, or with an unusable gender cell, are excluded.
pub fn summarize_gender(
    master: &Sheet,
    snapshot: &[(String, String)],
) -> Result<Vec<GenderSummaryRow>> {
    let blocks = header_blocks(&master.rows, &GENDER_HEADER_FRAGMENTS);
    if blocks.is_empty() {
        return Err(SyncError::MissingColumns {
            table: master.name.clone(),
            columns: GENDER_HEADER_FRAGMENTS.join(", "),
        });
    }

    // Snapshot rows may carry the padded output form of the RUC; key the
    // join on the loose profile so both forms meet.
    let tier_by_ruc: HashMap<String, &str> = snapshot
        .iter()
        .map(|(ruc, tier)| (normalize_ruc(ruc), tier.as_str()))
        .collect();

    let map = FieldMap::new()
        .field("ruc", &["RUC"])
        .field("genero", &["GENERO"]);

    // (femenino, masculino) per tier label
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for block in blocks {
        let rows = extract_rows(
            master.header(block),
            master.data(block),
            block.data_start,
            &map,
            ExtractOptions { require_numeric_index: true },
        );
        for row in rows {
            let ruc = normalize_ruc(row.get("ruc"));
            let gender = normalize_gender(row.get("genero"));
            let Some(tier) = tier_by_ruc.get(ruc.as_str()) else {
                continue;
            };
            let entry = counts.entry(tier.to_string()).or_default();
            match gender.as_str() {
                "FEMENINO" => entry.0 += 1,
                "MASCULINO" => entry.1 += 1,
                _ => {}
            }
        }
    }

    let summary: Vec<GenderSummaryRow> = SizeTier::LADDER
        .iter()
        .filter_map(|tier| {
            let &(femenino, masculino) = counts.get(tier.label())?;
            let total = femenino + masculino;
            if total == 0 {
                return None;
            }
            Some(GenderSummaryRow {
                tamano: tier.label().to_string(),
                femenino,
                masculino,
                total,
                pct_femenino: round2(femenino as f64 * 100.0 / total as f64),
                pct_masculino: round2(masculino as f64 * 100.0 / total as f64),
            })
        })
        .collect();

    info!(tiers = summary.len(), "gender summary complete");
    Ok(summary)
}

/// Renders the summary as the report table.
pub fn gender_table(rows: &[GenderSummaryRow]) -> Vec<Vec<String>> {
    let mut table = vec![vec![
        "Tamano".to_string(),
        "Femenino".to_string(),
        "Masculino".to_string(),
        "Total".to_string(),
        "% Femenino".to_string(),
        "% Masculino".to_string(),
    ]];
    table.extend(rows.iter().map(|row| {
        vec![
            row.tamano.clone(),
            row.femenino.to_string(),
            row.masculino.to_string(),
            row.total.to_string(),
            format!("{:.2}", row.pct_femenino),
            format!("{:.2}", row.pct_masculino),
        ]
    }));
    table
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            "BASE DE DATOS",
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn snapshot() -> Vec<(String, String)> {
        vec![
            ("991".to_string(), "MICRO".to_string()),
            ("881".to_string(), "MICRO".to_string()),
            ("771".to_string(), "GRANDE".to_string()),
        ]
    }

    #[test]
    fn counts_follow_tier_ladder_order() {
        let master = sheet(&[
            &["N", "RUC", "GENERO GERENTE"],
            &["1", "0991", "F"],
            &["2", "0881", "Masculino"],
            &["3", "0771", "femenina"],
            &["4", "0661", "F"],
            &["nota", "", ""],
        ]);
        let summary = summarize_gender(&master, &snapshot()).unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].tamano, "MICRO");
        assert_eq!(summary[0].femenino, 1);
        assert_eq!(summary[0].masculino, 1);
        assert_eq!(summary[0].pct_femenino, 50.0);
        assert_eq!(summary[1].tamano, "GRANDE");
        assert_eq!(summary[1].femenino, 1);
        assert_eq!(summary[1].pct_femenino, 100.0);
    }

    #[test]
    fn junk_gender_cells_are_excluded() {
        let master = sheet(&[
            &["N", "RUC", "GENERO"],
            &["1", "0991", "NAN"],
            &["2", "0881", ""],
        ]);
        let summary = summarize_gender(&master, &snapshot()).unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn missing_gender_column_aborts() {
        let master = sheet(&[&["N", "RUC", "TAMANO"], &["1", "0991", "MICRO"]]);
        let err = summarize_gender(&master, &snapshot()).unwrap_err();
        assert!(matches!(err, SyncError::MissingColumns { .. }));
    }
}
