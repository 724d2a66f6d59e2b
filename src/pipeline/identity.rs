//! Company identity resolution against the master registry.
//!
//! The registry sheet is split into two (sometimes more) physically separate
//! tables with independent headers, so the lookup is built block by block.
//! When two blocks map the same company name to different RUCs the later
//! block silently wins; that matches the behavior the association has been
//! operating with, see DESIGN.md for the known ambiguity.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::observability::metrics;
use crate::tabular::extract::{extract_rows, ExtractOptions, FieldMap};
use crate::tabular::headers::header_blocks;
use crate::tabular::normalize::{normalize_name, normalize_ruc};
use crate::tabular::Sheet;

/// Fragments that identify a registry header row. "RAZON_SOCIAL" matches the
/// underscore and space spellings alike after label normalization.
const REGISTRY_HEADER_FRAGMENTS: [&str; 2] = ["RUC", "RAZON_SOCIAL"];

/// The outcome of resolving one source row to a company identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Aggregation key: the RUC when known, else the normalized name.
    pub key: String,
    /// Resolved RUC, empty when the company is not in the registry.
    pub ruc: String,
}

/// Immutable name→RUC and RUC→tier lookups, built once per run and passed
/// into the jobs that need them.
#[derive(Debug, Clone, Default)]
pub struct RegistryLookup {
    name_to_ruc: HashMap<String, String>,
    ruc_to_tier: HashMap<String, String>,
}

impl RegistryLookup {
    /// Builds the lookup from the master registry grid and, when available,
    /// the current-tier snapshot table (RUC, tier label).
    ///
    /// A registry without a single recognizable header block cannot anchor
    /// any identity work, so that aborts the run.
    pub fn build(master: &Sheet, tier_snapshot: Option<&Sheet>) -> Result<Self> {
        let blocks = header_blocks(&master.rows, &REGISTRY_HEADER_FRAGMENTS);
        if blocks.is_empty() {
            return Err(SyncError::MissingColumns {
                table: master.name.clone(),
                columns: REGISTRY_HEADER_FRAGMENTS.join(", "),
            });
        }

        let map = FieldMap::new()
            .field("ruc", &["RUC"])
            .field("razon_social", &["RAZON_SOCIAL"]);

        let mut name_to_ruc = HashMap::new();
        for block in blocks {
            let rows = extract_rows(
                master.header(block),
                master.data(block),
                block.data_start,
                &map,
                ExtractOptions::default(),
            );
            for row in rows {
                let ruc = normalize_ruc(row.get("ruc"));
                let name = normalize_name(row.get("razon_social"));
                if !ruc.is_empty() && !name.is_empty() {
                    // Last write wins across blocks, preserved legacy behavior.
                    name_to_ruc.insert(name, ruc);
                }
            }
        }
        debug!(companies = name_to_ruc.len(), "registry name lookup built");

        let mut ruc_to_tier = HashMap::new();
        if let Some(snapshot) = tier_snapshot {
            for row in snapshot.rows.iter().skip(1) {
                let ruc = normalize_ruc(row.first().map(String::as_str).unwrap_or(""));
                let tier = row.get(1).map(|c| c.trim().to_uppercase()).unwrap_or_default();
                if !ruc.is_empty() && !tier.is_empty() {
                    ruc_to_tier.insert(ruc, tier);
                }
            }
        }

        Ok(Self { name_to_ruc, ruc_to_tier })
    }

    /// Resolution order: a row's own RUC is trusted outright; otherwise the
    /// registry is consulted by normalized name; otherwise the record rides
    /// on its name as the key. Returns `None` only when both identifiers are
    /// empty, in which case the row cannot be joined to anything.
    pub fn resolve(&self, raw_ruc: &str, raw_name: &str) -> Option<ResolvedIdentity> {
        let own_ruc = normalize_ruc(raw_ruc);
        if !own_ruc.is_empty() {
            metrics::identity::resolved_by_ruc();
            return Some(ResolvedIdentity { key: own_ruc.clone(), ruc: own_ruc });
        }

        let name = normalize_name(raw_name);
        if name.is_empty() {
            return None;
        }
        match self.name_to_ruc.get(&name) {
            Some(ruc) => {
                metrics::identity::resolved_by_name();
                Some(ResolvedIdentity { key: ruc.clone(), ruc: ruc.clone() })
            }
            None => {
                metrics::identity::unresolved();
                warn!(company = %name, "company not found in registry, keying by name");
                Some(ResolvedIdentity { key: name, ruc: String::new() })
            }
        }
    }

    /// Tier backfill by RUC; empty when unknown, never guessed.
    pub fn tier_for_ruc(&self, raw_ruc: &str) -> &str {
        self.ruc_to_tier
            .get(&normalize_ruc(raw_ruc))
            .map(String::as_str)
            .unwrap_or("")
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
                &["padron general", "", ""],
                &["N", "RUC", "RAZON SOCIAL"],
                &["1", "'0992233445001", "Industrias Álvarez"],
                &["2", "0881122334001", "BETA CIA LTDA"],
                &["", "", ""],
                &["RAZON_SOCIAL", "RUC", "N"],
                &["GAMMA S.A.", "0771", "1"],
                &["BETA CIA LTDA", "0999", "2"],
            ],
        )
    }

    fn snapshot() -> Sheet {
        sheet(
            "TAMANO_EMPRESA_GLOBAL",
            &[
                &["RUC", "Tamano"],
                &["992233445001", "MICRO"],
                &["771", "grande"],
            ],
        )
    }

    #[test]
    fn own_ruc_is_trusted_over_the_registry() {
        let lookup = RegistryLookup::build(&master(), Some(&snapshot())).unwrap();
        let resolved = lookup.resolve("'0992233445001", "SOMETHING ELSE").unwrap();
        assert_eq!(resolved.key, "992233445001");
        assert_eq!(resolved.ruc, "992233445001");
    }

    #[test]
    fn names_resolve_across_blocks_with_last_write_wins() {
        let lookup = RegistryLookup::build(&master(), None).unwrap();
        // Accent-folded lookup from block one
        let resolved = lookup.resolve("", "industrias alvarez").unwrap();
        assert_eq!(resolved.ruc, "992233445001");
        // BETA appears in both blocks; the second block's RUC wins
        let beta = lookup.resolve("", "BETA CIA LTDA").unwrap();
        assert_eq!(beta.ruc, "999");
    }

    #[test]
    fn unknown_names_fall_back_to_name_key() {
        let lookup = RegistryLookup::build(&master(), None).unwrap();
        let resolved = lookup.resolve("", "Taller Nuevo").unwrap();
        assert_eq!(resolved.key, "TALLER NUEVO");
        assert_eq!(resolved.ruc, "");
    }

    #[test]
    fn blank_rows_resolve_to_nothing() {
        let lookup = RegistryLookup::build(&master(), None).unwrap();
        assert_eq!(lookup.resolve("", "  "), None);
    }

    #[test]
    fn tier_backfill_uses_normalized_ruc() {
        let lookup = RegistryLookup::build(&master(), Some(&snapshot())).unwrap();
        assert_eq!(lookup.tier_for_ruc("'0992233445001"), "MICRO");
        assert_eq!(lookup.tier_for_ruc("0771"), "GRANDE");
        assert_eq!(lookup.tier_for_ruc("555"), "");
    }

    #[test]
    fn registry_without_header_block_aborts() {
        let bare = sheet("BASE DE DATOS", &[&["just", "noise"]]);
        let err = RegistryLookup::build(&bare, None).unwrap_err();
        assert!(matches!(err, SyncError::MissingColumns { .. }));
    }
}
