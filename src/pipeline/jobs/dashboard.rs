//! Consolidated company overview: registry fields merged across blocks with
//! last-non-empty-wins semantics, historical year-column revenue summed per
//! row, sector enrichment from the sector tab, and new-sales totals from the
//! sales tab added on top.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{Result, SyncError};
use crate::tabular::extract::{extract_rows, ExtractOptions, FieldMap};
use crate::tabular::headers::{find_col, header_blocks};
use crate::tabular::normalize::{is_year_label, normalize_ruc, normalize_ruc_strict, parse_amount};
use crate::tabular::Sheet;

/// One consolidated overview row, keyed by RUC.
#[derive(Debug, Clone, Default)]
pub struct OverviewRecord {
    pub ruc: String,
    pub empresa: String,
    pub tamano: String,
    pub estado: String,
    pub sector: String,
    pub colaboradores: String,
    pub semaforo: String,
    pub ventas_totales: f64,
}

const REGISTRY_HEADER_FRAGMENTS: [&str; 2] = ["RUC", "TAMANO"];

/// Builds the overview. The sector sheet is enrichment only and may be
/// absent; sales may legitimately be empty.
pub fn build_overview(
    master: &Sheet,
    sales: &Sheet,
    sector: Option<&Sheet>,
) -> Result<Vec<OverviewRecord>> {
    let sector_map = sector.map(collect_sector_map).unwrap_or_default();
    let mut records = collect_registry_records(master, &sector_map)?;
    let new_sales = collect_new_sales(sales)?;

    for record in &mut records {
        if let Some(amount) = new_sales.get(&record.ruc) {
            record.ventas_totales += amount;
        }
    }

    info!(companies = records.len(), "overview consolidation complete");
    Ok(records)
}

/// RUC → sector from the lookup tab. Used for enrichment, never identity.
fn collect_sector_map(sheet: &Sheet) -> HashMap<String, String> {
    let Some(header) = sheet.rows.first() else {
        return HashMap::new();
    };
    let (Some(ruc_col), Some(sector_col)) = (find_col(header, "RUC"), find_col(header, "SECTOR"))
    else {
        warn!(table = %sheet.name, "sector tab lacks RUC/SECTOR columns, skipping enrichment");
        return HashMap::new();
    };

    let mut map = HashMap::new();
    for row in sheet.rows.iter().skip(1) {
        let ruc = normalize_ruc(row.get(ruc_col).map(String::as_str).unwrap_or(""));
        let sector = row
            .get(sector_col)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();
        if !ruc.is_empty() {
            map.insert(ruc, sector);
        }
    }
    map
}

fn collect_registry_records(
    master: &Sheet,
    sector_map: &HashMap<String, String>,
) -> Result<Vec<OverviewRecord>> {
    let blocks = header_blocks(&master.rows, &REGISTRY_HEADER_FRAGMENTS);
    if blocks.is_empty() {
        return Err(SyncError::MissingColumns {
            table: master.name.clone(),
            columns: REGISTRY_HEADER_FRAGMENTS.join(", "),
        });
    }

    let map = FieldMap::new()
        .field("ruc", &["RUC"])
        .field("empresa", &["RAZON_SOCIAL"])
        .field("tamano", &["TAMANO"])
        .field("estado", &["ESTADO"])
        .field("colaboradores", &["COLABORADORES"])
        .field("semaforo", &["SEMAFORO"])
        .field("sector", &["SECTOR"]);

    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, OverviewRecord> = HashMap::new();

    for block in blocks {
        let header = master.header(block);
        // Year columns are block-specific; resolve them alongside the fields.
        let year_cols: Vec<usize> = header
            .iter()
            .enumerate()
            .filter(|(_, label)| is_year_label(label))
            .map(|(idx, _)| idx)
            .collect();

        let rows = extract_rows(
            header,
            master.data(block),
            block.data_start,
            &map,
            ExtractOptions::default(),
        );
        for row in rows {
            let ruc = normalize_ruc(row.get("ruc"));
            if ruc.is_empty() {
                continue;
            }
            let historical: f64 = year_cols
                .iter()
                .filter_map(|&idx| master.rows[row.source_row].get(idx))
                .map(|cell| parse_amount(cell))
                .sum();

            let sector = sector_map
                .get(&ruc)
                .filter(|s| !s.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| row.get("sector").to_string());

            let entry = merged.entry(ruc.clone()).or_insert_with(|| {
                order.push(ruc.clone());
                OverviewRecord { ruc: ruc.clone(), ..OverviewRecord::default() }
            });
            take_non_empty(&mut entry.empresa, row.get("empresa"));
            take_non_empty(&mut entry.tamano, row.get("tamano"));
            take_non_empty(&mut entry.estado, row.get("estado"));
            take_non_empty(&mut entry.colaboradores, row.get("colaboradores"));
            take_non_empty(&mut entry.semaforo, row.get("semaforo"));
            take_non_empty(&mut entry.sector, &sector);
            entry.ventas_totales += historical;
        }
    }

    Ok(order
        .into_iter()
        .map(|ruc| merged.remove(&ruc).expect("ruc tracked in order"))
        .collect())
}

/// New sales aggregated per RUC. The estimated-amount column is preferred
/// when both spellings are present.
fn collect_new_sales(sales: &Sheet) -> Result<HashMap<String, f64>> {
    let Some(header) = sales.rows.first() else {
        return Ok(HashMap::new());
    };

    let map = FieldMap::new()
        .field("ruc", &["RUC"])
        .field("monto", &["MONTO_ESTIMADO", "MONTO"]);

    let resolved = map.resolve(header);
    if !resolved.has_all(&["ruc", "monto"]) {
        return Err(SyncError::MissingColumns {
            table: sales.name.clone(),
            columns: resolved.missing(&["ruc", "monto"]).join(", "),
        });
    }

    let rows = extract_rows(header, &sales.rows[1..], 1, &map, ExtractOptions::default());
    let mut grouped: HashMap<String, f64> = HashMap::new();
    for row in rows {
        let ruc = normalize_ruc(row.get("ruc"));
        if ruc.is_empty() {
            continue;
        }
        *grouped.entry(ruc).or_insert(0.0) += parse_amount(row.get("monto"));
    }
    Ok(grouped)
}

/// Renders the overview as the dashboard output table.
pub fn overview_table(records: &[OverviewRecord]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "RUC".to_string(),
        "Empresa".to_string(),
        "Tamano".to_string(),
        "Estado".to_string(),
        "Sector".to_string(),
        "Colaboradores".to_string(),
        "Semaforo".to_string(),
        "Ventas Totales".to_string(),
    ]];
    rows.extend(records.iter().map(|record| {
        vec![
            normalize_ruc_strict(&record.ruc),
            record.empresa.clone(),
            record.tamano.clone(),
            record.estado.clone(),
            record.sector.clone(),
            record.colaboradores.clone(),
            record.semaforo.clone(),
            format!("{:.2}", record.ventas_totales),
        ]
    }));
    rows
}

/// A later non-empty value replaces the slot; a later empty one never
/// clears it. Same rule the aggregator applies to its string fields.
fn take_non_empty(slot: &mut String, candidate: &str) {
    if !candidate.trim().is_empty() {
        *slot = candidate.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            name,
            rows.iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn master() -> Sheet {
        sheet(
            "BASE DE DATOS",
            &[
                &["N", "RUC", "RAZON SOCIAL", "TAMANO", "ESTADO", "2021", "2022", "SECTOR"],
                &["1", "0991", "ACME S.A.", "MICRO", "ACTIVO", "1000", "2500", "ALIMENTOS"],
                &["", "", "", "", "", "", "", ""],
                &["RUC", "TAMANO", "ESTADO", "SEMAFORO", "2023"],
                &["0991", "", "SUSPENDIDO", "VERDE", "500"],
                &["0881", "GRANDE", "", "ROJO", "80"],
            ],
        )
    }

    fn sales() -> Sheet {
        sheet(
            "VENTAS_AFILIADOS",
            &[
                &["RUC", "MONTO ESTIMADO"],
                &["0991", "$1,000"],
                &["0991", "250"],
            ],
        )
    }

    fn sector() -> Sheet {
        sheet(
            "SECTOR",
            &[&["RUC", "SECTOR"], &["991", "METALMECANICA"]],
        )
    }

    #[test]
    fn blocks_merge_with_last_non_empty_and_year_sums() {
        let records = build_overview(&master(), &sales(), Some(&sector())).unwrap();

        let acme = records.iter().find(|r| r.ruc == "991").unwrap();
        assert_eq!(acme.empresa, "ACME S.A.");
        assert_eq!(acme.tamano, "MICRO");
        // Block two's non-empty ESTADO overwrites block one's
        assert_eq!(acme.estado, "SUSPENDIDO");
        assert_eq!(acme.semaforo, "VERDE");
        // 1000 + 2500 + 500 historical, plus 1250 new sales
        assert_eq!(acme.ventas_totales, 5250.0);

        let beta = records.iter().find(|r| r.ruc == "881").unwrap();
        assert_eq!(beta.tamano, "GRANDE");
        assert_eq!(beta.ventas_totales, 80.0);
    }

    #[test]
    fn sector_tab_wins_over_in_row_sector() {
        let records = build_overview(&master(), &sales(), Some(&sector())).unwrap();
        let acme = records.iter().find(|r| r.ruc == "991").unwrap();
        assert_eq!(acme.sector, "METALMECANICA");
    }

    #[test]
    fn in_row_sector_is_kept_without_the_tab() {
        let records = build_overview(&master(), &sales(), None).unwrap();
        let acme = records.iter().find(|r| r.ruc == "991").unwrap();
        assert_eq!(acme.sector, "ALIMENTOS");
    }

    #[test]
    fn rows_without_ruc_are_skipped() {
        let master = sheet(
            "BASE DE DATOS",
            &[
                &["RUC", "TAMANO", "RAZON SOCIAL"],
                &["", "MICRO", "SIN RUC"],
                &["0991", "MICRO", "ACME"],
            ],
        );
        let records = build_overview(&master, &sales(), None).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn table_layout_matches_the_dashboard_contract() {
        let records = build_overview(&master(), &sales(), Some(&sector())).unwrap();
        let table = overview_table(&records);
        assert_eq!(
            table[0],
            vec!["RUC", "Empresa", "Tamano", "Estado", "Sector", "Colaboradores", "Semaforo", "Ventas Totales"]
        );
        assert_eq!(table.len(), records.len() + 1);
    }
}
