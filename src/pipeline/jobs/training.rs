//! Training consolidation: merges the historic training sheet with the
//! incremental sign-up sheet into one per-company table, resolving every row
//! against the registry and backfilling tiers from the current snapshot.

use tracing::info;

use crate::constants::NON_MEMBER_SENTINEL;
use crate::domain::CompanyRecord;
use crate::error::{Result, SyncError};
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::identity::RegistryLookup;
use crate::tabular::extract::{extract_rows, ExtractOptions, FieldMap};
use crate::tabular::headers::find_header_rows;
use crate::tabular::normalize::{normalize_name, normalize_ruc_strict};
use crate::tabular::Sheet;

/// Consolidates both training sources. Historic rows are processed before
/// incremental rows; the merge's last-non-empty semantics depend on it.
pub fn consolidate_training(
    historic: &Sheet,
    incremental: &Sheet,
    lookup: &RegistryLookup,
) -> Result<Vec<CompanyRecord>> {
    let mut records = Vec::new();
    records.extend(historic_records(historic, lookup)?);
    records.extend(incremental_records(incremental, lookup)?);

    let consolidated = aggregate(records);
    info!(companies = consolidated.len(), "training consolidation complete");
    Ok(consolidated)
}

/// Historic sheet: totals per company, guarded by the numeric row index in
/// the first column. The sheet carries its own tier column which, when
/// empty, falls back to the snapshot tier for the resolved RUC.
fn historic_records(
    sheet: &Sheet,
    lookup: &RegistryLookup,
) -> Result<Vec<(String, CompanyRecord)>> {
    let map = FieldMap::new()
        .field("razon_social", &["RAZON_SOCIAL"])
        .field("tamano", &["TAMANO"])
        .field("total_cap", &["TOTAL_CAPAC"])
        .field("valor_total", &["VALOR_TOTAL"]);

    let header_row = find_header_rows(&sheet.rows, &["RAZON_SOCIAL", "TOTAL_CAPAC"])
        .into_iter()
        .next()
        .ok_or_else(|| SyncError::MissingColumns {
            table: sheet.name.clone(),
            columns: "RAZON_SOCIAL, TOTAL_CAPAC".to_string(),
        })?;

    let header = &sheet.rows[header_row];
    let rows = extract_rows(
        header,
        &sheet.rows[header_row + 1..],
        header_row + 1,
        &map,
        ExtractOptions { require_numeric_index: true },
    );

    let mut records = Vec::new();
    for row in rows {
        let name = row.get("razon_social").trim().to_string();
        if name.is_empty() {
            continue;
        }
        let Some(identity) = lookup.resolve("", &name) else {
            continue;
        };
        let tier_in_sheet = normalize_name(row.get("tamano"));
        let tier = if tier_in_sheet.is_empty() {
            lookup.tier_for_ruc(&identity.ruc).to_string()
        } else {
            tier_in_sheet
        };

        records.push((
            identity.key,
            CompanyRecord {
                ruc: identity.ruc,
                razon_social: name.clone(),
                tamano: tier,
                total_cap: row.amount("total_cap") as u64,
                valor_total: row.amount("valor_total"),
                es_socio: normalize_name(&name) != NON_MEMBER_SENTINEL,
            },
        ));
    }
    Ok(records)
}

/// Incremental sheet: one row per attended session, so each row contributes
/// a count of one plus its payment value.
fn incremental_records(
    sheet: &Sheet,
    lookup: &RegistryLookup,
) -> Result<Vec<(String, CompanyRecord)>> {
    let Some(header) = sheet.rows.first() else {
        return Ok(Vec::new());
    };

    let map = FieldMap::new()
        .field("razon_social", &["RAZON_SOCIAL"])
        .field("valor_pago", &["VALOR_DEL_PAGO", "VALOR"]);

    let resolved = map.resolve(header);
    if !resolved.has_all(&["razon_social"]) {
        return Err(SyncError::MissingColumns {
            table: sheet.name.clone(),
            columns: "RAZON_SOCIAL".to_string(),
        });
    }

    let rows = extract_rows(header, &sheet.rows[1..], 1, &map, ExtractOptions::default());

    let mut records = Vec::new();
    for row in rows {
        let name = row.get("razon_social").trim().to_string();
        if name.is_empty() {
            continue;
        }
        let Some(identity) = lookup.resolve("", &name) else {
            continue;
        };
        let tier = lookup.tier_for_ruc(&identity.ruc).to_string();

        records.push((
            identity.key,
            CompanyRecord {
                ruc: identity.ruc,
                razon_social: name.clone(),
                tamano: tier,
                total_cap: 1,
                valor_total: row.amount("valor_pago"),
                es_socio: normalize_name(&name) != NON_MEMBER_SENTINEL,
            },
        ));
    }
    Ok(records)
}

/// Renders the consolidated records as the output table.
pub fn training_table(records: &[CompanyRecord]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "ruc".to_string(),
        "razon_social".to_string(),
        "tamano".to_string(),
        "total_cap".to_string(),
        "valor_total".to_string(),
        "es_socio".to_string(),
    ]];
    rows.extend(records.iter().map(|record| {
        vec![
            normalize_ruc_strict(&record.ruc),
            record.razon_social.clone(),
            record.tamano.clone(),
            record.total_cap.to_string(),
            format!("{:.2}", record.valor_total),
            record.es_socio.to_string(),
        ]
    }));
    rows
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

    fn lookup() -> RegistryLookup {
        let master = sheet(
            "BASE DE DATOS",
            &[
                &["N", "RUC", "RAZON SOCIAL"],
                &["1", "0991", "ACME S.A."],
                &["2", "0881", "BETA CIA"],
            ],
        );
        let snapshot = sheet(
            "TAMANO_EMPRESA_GLOBAL",
            &[&["RUC", "Tamano"], &["991", "MEDIANA"], &["881", "MICRO"]],
        );
        RegistryLookup::build(&master, Some(&snapshot)).unwrap()
    }

    fn historic() -> Sheet {
        sheet(
            "CAPACITACIONES",
            &[
                &["listado historico", "", "", ""],
                &["N", "RAZON SOCIAL", "TAMANO", "TOTAL CAPACITACIONES", "VALOR TOTAL"],
                &["1", "ACME S.A.", "", "3", "450"],
                &["2", "NO SOCIOS", "", "5", "0"],
                &["TOTAL", "", "", "8", "450"],
            ],
        )
    }

    fn incremental() -> Sheet {
        sheet(
            "CAPACITACIONES_FINAL",
            &[
                &["Razon Social", "Valor del Pago"],
                &["ACME S.A.", "120"],
                &["Beta Cia", "60"],
                &["NO SOCIOS", "30"],
            ],
        )
    }

    #[test]
    fn sources_merge_by_resolved_ruc() {
        let records = consolidate_training(&historic(), &incremental(), &lookup()).unwrap();

        let acme = records.iter().find(|r| r.ruc == "991").unwrap();
        assert_eq!(acme.total_cap, 4);
        assert_eq!(acme.valor_total, 570.0);
        assert_eq!(acme.tamano, "MEDIANA");
        assert!(acme.es_socio);

        let beta = records.iter().find(|r| r.ruc == "881").unwrap();
        assert_eq!(beta.total_cap, 1);
        assert_eq!(beta.tamano, "MICRO");
    }

    #[test]
    fn sentinel_rows_never_read_as_members() {
        let records = consolidate_training(&historic(), &incremental(), &lookup()).unwrap();
        let sentinel = records.iter().find(|r| r.razon_social == "NO SOCIOS").unwrap();
        assert!(!sentinel.es_socio);
        assert_eq!(sentinel.total_cap, 6);
        assert_eq!(sentinel.ruc, "");
    }

    #[test]
    fn subtotal_rows_are_excluded_by_the_index_guard() {
        let records = historic_records(&historic(), &lookup()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn historic_sheet_without_headers_aborts() {
        let bad = sheet("CAPACITACIONES", &[&["x", "y"], &["1", "2"]]);
        let err = consolidate_training(&bad, &incremental(), &lookup()).unwrap_err();
        assert!(matches!(err, SyncError::MissingColumns { .. }));
    }

    #[test]
    fn table_rendering_includes_header() {
        let records = consolidate_training(&historic(), &incremental(), &lookup()).unwrap();
        let table = training_table(&records);
        assert_eq!(table[0][0], "ruc");
        assert_eq!(table.len(), records.len() + 1);
    }
}
