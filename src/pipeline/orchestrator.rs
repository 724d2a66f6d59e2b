//! Runs the jobs in their documented order against a workbook store.
//!
//! Each job computes its whole result before anything is published, so a
//! failed job leaves the workbook exactly as it found it; the run is the
//! unit of atomicity and can be retried from scratch.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::constants::{
    DASHBOARD_TAB, GENDER_SUMMARY_TAB, MASTER_REGISTRY_TAB, SALES_TAB, SECTOR_TAB,
    TIER_SNAPSHOT_TAB, TRAINING_DASH_TAB, TRAINING_HISTORIC_TAB, TRAINING_INCREMENTAL_TAB,
    TRANSITION_DETAIL_TAB, TRANSITION_SUMMARY_TAB,
};
use crate::pipeline::identity::RegistryLookup;
use crate::pipeline::jobs::dashboard::{build_overview, overview_table};
use crate::pipeline::jobs::gender::{gender_table, summarize_gender};
use crate::pipeline::jobs::sizes::reconcile_sizes;
use crate::pipeline::jobs::training::{consolidate_training, training_table};
use crate::storage::WorkbookStore;

/// Bookkeeping record for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub companies_reconciled: usize,
    pub transitions_detected: usize,
    pub tables_written: Vec<String>,
}

pub struct PipelineOrchestrator {
    store: Arc<dyn WorkbookStore>,
}

impl PipelineOrchestrator {
    pub fn new(store: Arc<dyn WorkbookStore>) -> Self {
        Self { store }
    }

    /// Size reconciliation: reads the registry and sales tabs, publishes the
    /// transition detail/summary, the current-tier snapshot and the registry
    /// writeback. Returns (companies, transitions).
    #[instrument(skip(self))]
    pub async fn run_sizes(&self) -> Result<(usize, usize)> {
        let master = self.store.read_table(MASTER_REGISTRY_TAB).await?;
        let sales = self.store.read_table(SALES_TAB).await?;

        let output = reconcile_sizes(&master, &sales)?;

        self.store
            .write_table(TRANSITION_DETAIL_TAB, output.detail_table())
            .await?;
        self.store
            .write_table(TRANSITION_SUMMARY_TAB, output.summary_table())
            .await?;
        self.store
            .write_table(TIER_SNAPSHOT_TAB, output.snapshot_table())
            .await?;
        self.store
            .write_table(MASTER_REGISTRY_TAB, output.updated_master.rows.clone())
            .await?;

        Ok((output.records.len(), output.transitions.len()))
    }

    /// Training consolidation into the training dashboard tab.
    #[instrument(skip(self))]
    pub async fn run_training(&self) -> Result<usize> {
        let master = self.store.read_table(MASTER_REGISTRY_TAB).await?;
        let snapshot = self.store.read_table_opt(TIER_SNAPSHOT_TAB).await?;
        let historic = self.store.read_table(TRAINING_HISTORIC_TAB).await?;
        let incremental = self.store.read_table(TRAINING_INCREMENTAL_TAB).await?;

        let lookup = RegistryLookup::build(&master, snapshot.as_ref())?;
        let records = consolidate_training(&historic, &incremental, &lookup)?;

        self.store
            .write_table(TRAINING_DASH_TAB, training_table(&records))
            .await?;
        Ok(records.len())
    }

    /// Company overview into the dashboard tab.
    #[instrument(skip(self))]
    pub async fn run_dashboard(&self) -> Result<usize> {
        let master = self.store.read_table(MASTER_REGISTRY_TAB).await?;
        let sales = self.store.read_table(SALES_TAB).await?;
        let sector = self.store.read_table_opt(SECTOR_TAB).await?;

        let records = build_overview(&master, &sales, sector.as_ref())?;

        self.store
            .write_table(DASHBOARD_TAB, overview_table(&records))
            .await?;
        Ok(records.len())
    }

    /// Gender-by-tier summary, joined against the published snapshot.
    #[instrument(skip(self))]
    pub async fn run_gender(&self) -> Result<usize> {
        let master = self.store.read_table(MASTER_REGISTRY_TAB).await?;
        let snapshot_sheet = self.store.read_table(TIER_SNAPSHOT_TAB).await?;

        let snapshot: Vec<(String, String)> = snapshot_sheet
            .rows
            .iter()
            .skip(1)
            .filter(|row| row.len() >= 2)
            .map(|row| (row[0].clone(), row[1].clone()))
            .collect();

        let rows = summarize_gender(&master, &snapshot)?;
        self.store
            .write_table(GENDER_SUMMARY_TAB, gender_table(&rows))
            .await?;
        Ok(rows.len())
    }

    /// Full run in the documented order: sizes first (the other jobs read
    /// its snapshot), then training, dashboard and the gender report.
    pub async fn run_all(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(%run_id, "pipeline run starting");

        let (companies, transitions) = self.run_sizes().await?;
        self.run_training().await?;
        self.run_dashboard().await?;
        self.run_gender().await?;

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            companies_reconciled: companies,
            transitions_detected: transitions,
            tables_written: vec![
                TRANSITION_DETAIL_TAB.to_string(),
                TRANSITION_SUMMARY_TAB.to_string(),
                TIER_SNAPSHOT_TAB.to_string(),
                MASTER_REGISTRY_TAB.to_string(),
                TRAINING_DASH_TAB.to_string(),
                DASHBOARD_TAB.to_string(),
                GENDER_SUMMARY_TAB.to_string(),
            ],
        };
        info!(
            %run_id,
            companies = summary.companies_reconciled,
            transitions = summary.transitions_detected,
            "pipeline run finished"
        );
        Ok(summary)
    }
}
