//! Size-tier reconciliation: merges historic tier labels from the master
//! registry with tiers computed from reported yearly sales, then derives the
//! transition detail, transition summary and current-tier snapshot tables
//! plus the registry code writeback.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::domain::{SizeTier, TierRecords, TransitionRecord};
use crate::error::{Result, SyncError};
use crate::pipeline::transitions::{
    current_tier_snapshot, detect_transitions, summarize, TransitionSummaryRow,
};
use crate::pipeline::writeback::write_size_codes;
use crate::tabular::extract::{extract_rows, ExtractOptions, FieldMap};
use crate::tabular::headers::header_blocks;
use crate::tabular::normalize::{normalize_ruc, normalize_ruc_strict, parse_amount, parse_year};
use crate::tabular::Sheet;

/// Everything the size job computes in one pass. Output tables are published
/// by the caller only after the whole computation has succeeded.
#[derive(Debug)]
pub struct SizesOutput {
    pub records: TierRecords,
    pub transitions: Vec<TransitionRecord>,
    pub summary: Vec<TransitionSummaryRow>,
    pub snapshot: Vec<(String, String)>,
    pub updated_master: Sheet,
}

/// Fragments that mark a usable tier-history block in the registry.
const HISTORY_HEADER_FRAGMENTS: [&str; 2] = ["RUC", "TAMANO"];

/// Runs the reconciliation against the master registry and sales grids.
pub fn reconcile_sizes(master: &Sheet, sales: &Sheet) -> Result<SizesOutput> {
    let historicos = collect_historic_tiers(master)?;
    let sales_by_year = collect_sales(sales)?;

    let mut records = TierRecords::new();
    for (ruc, year, tier) in historicos {
        records.entry(ruc).or_default().insert(year, tier);
    }
    // Sales-derived tiers are applied second and overwrite explicit labels
    // for the same year; the sales ledger is the fresher source.
    for ((ruc, year), amount) in sales_by_year {
        records
            .entry(ruc)
            .or_default()
            .insert(year, SizeTier::classify(amount).label().to_string());
    }

    let (transitions, histogram) = detect_transitions(&records);
    let summary = summarize(&histogram);
    let snapshot = current_tier_snapshot(&records);
    let updated_master = write_size_codes(master, &records);

    info!(
        companies = records.len(),
        transitions = transitions.len(),
        "size reconciliation complete"
    );

    Ok(SizesOutput { records, transitions, summary, snapshot, updated_master })
}

impl SizesOutput {
    /// Transition detail table, one row per detected change.
    pub fn detail_table(&self) -> Vec<Vec<String>> {
        let mut rows = vec![vec![
            "RUC".to_string(),
            "Ano Inicial".to_string(),
            "Tamano Inicial".to_string(),
            "Ano Final".to_string(),
            "Tamano Final".to_string(),
        ]];
        rows.extend(self.transitions.iter().map(|t| {
            vec![
                normalize_ruc_strict(&t.ruc),
                t.year_from.to_string(),
                t.tier_from.clone(),
                t.year_to.to_string(),
                t.tier_to.clone(),
            ]
        }));
        rows
    }

    /// Transition summary table; header only when nothing changed.
    pub fn summary_table(&self) -> Vec<Vec<String>> {
        let mut rows = vec![vec![
            "Cambio".to_string(),
            "Empresas".to_string(),
            "%".to_string(),
        ]];
        rows.extend(self.summary.iter().map(|row| {
            vec![
                row.label.clone(),
                row.count.to_string(),
                format!("{:.2}%", row.percentage),
            ]
        }));
        rows
    }

    /// Current-tier snapshot table, one row per company.
    pub fn snapshot_table(&self) -> Vec<Vec<String>> {
        let mut rows = vec![vec!["RUC".to_string(), "Tamano".to_string()]];
        rows.extend(
            self.snapshot
                .iter()
                .map(|(ruc, tier)| vec![normalize_ruc_strict(ruc), tier.clone()]),
        );
        rows
    }
}

/// Collects (ruc, year, tier label) triples from every usable registry
/// block. A block missing the affiliation-date column contributes nothing;
/// a registry where no block is usable aborts the run.
fn collect_historic_tiers(master: &Sheet) -> Result<Vec<(String, i32, String)>> {
    let blocks = header_blocks(&master.rows, &HISTORY_HEADER_FRAGMENTS);
    if blocks.is_empty() {
        return Err(SyncError::MissingColumns {
            table: master.name.clone(),
            columns: HISTORY_HEADER_FRAGMENTS.join(", "),
        });
    }

    let map = FieldMap::new()
        .field("ruc", &["RUC"])
        .field("tamano", &["TAMANO"])
        .field("fecha", &["FECHA_AFILIACION"]);

    let mut triples = Vec::new();
    let mut usable_blocks = 0;
    for block in blocks {
        let header = master.header(block);
        let resolved = map.resolve(header);
        if !resolved.has_all(&["ruc", "tamano", "fecha"]) {
            warn!(
                table = %master.name,
                header_row = block.header_row,
                missing = ?resolved.missing(&["ruc", "tamano", "fecha"]),
                "registry block skipped for tier history"
            );
            continue;
        }
        usable_blocks += 1;

        let rows = extract_rows(
            header,
            master.data(block),
            block.data_start,
            &map,
            ExtractOptions::default(),
        );
        for row in rows {
            let ruc = normalize_ruc(row.get("ruc"));
            let tier = row.get("tamano").trim().to_uppercase();
            let year = parse_year(row.get("fecha"));
            if let (false, false, Some(year)) = (ruc.is_empty(), tier.is_empty(), year) {
                triples.push((ruc, year, tier));
            }
        }
    }

    if usable_blocks == 0 {
        return Err(SyncError::MissingColumns {
            table: master.name.clone(),
            columns: "RUC, TAMANO, FECHA_AFILIACION".to_string(),
        });
    }
    Ok(triples)
}

/// Sums reported sales per (ruc, year). Rows with a missing RUC or an
/// unparsable year are skipped; malformed amounts coerce to zero.
fn collect_sales(sales: &Sheet) -> Result<BTreeMap<(String, i32), f64>> {
    let Some(header) = sales.rows.first() else {
        return Ok(BTreeMap::new());
    };

    let map = FieldMap::new()
        .field("ruc", &["RUC"])
        .field("monto", &["MONTO"])
        .field("anio", &["ANO", "ANIO"]);

    let resolved = map.resolve(header);
    if !resolved.has_all(&["ruc", "monto", "anio"]) {
        return Err(SyncError::MissingColumns {
            table: sales.name.clone(),
            columns: resolved.missing(&["ruc", "monto", "anio"]).join(", "),
        });
    }

    let rows = extract_rows(header, &sales.rows[1..], 1, &map, ExtractOptions::default());
    let mut grouped: BTreeMap<(String, i32), f64> = BTreeMap::new();
    for row in rows {
        let ruc = normalize_ruc(row.get("ruc"));
        let year = match row.get("anio").trim().parse::<i32>() {
            Ok(year) => year,
            Err(_) => continue,
        };
        if ruc.is_empty() {
            continue;
        }
        *grouped.entry((ruc, year)).or_insert(0.0) += parse_amount(row.get("monto"));
    }
    Ok(grouped)
}
