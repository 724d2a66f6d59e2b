use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::observability::metrics;
use crate::tabular::Sheet;

use super::WorkbookStore;

/// Workbook backed by a directory holding one JSON grid per tab
/// (`<dir>/<TAB NAME>.json`, a JSON array of rows of strings).
///
/// This is the exchange format the sheet-sync tooling dumps and loads; tab
/// names are used verbatim as file stems, spaces included.
#[derive(Debug, Clone)]
pub struct JsonWorkbookStore {
    root: PathBuf,
}

impl JsonWorkbookStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }
}

#[async_trait]
impl WorkbookStore for JsonWorkbookStore {
    async fn read_table(&self, name: &str) -> Result<Sheet> {
        self.read_table_opt(name)
            .await?
            .ok_or_else(|| SyncError::MissingSource(name.to_string()))
    }

    async fn read_table_opt(&self, name: &str) -> Result<Option<Sheet>> {
        let path = self.table_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let rows: Vec<Vec<String>> = serde_json::from_str(&content)?;
        debug!(table = name, rows = rows.len(), "table loaded");
        Ok(Some(Sheet::new(name, rows)))
    }

    async fn write_table(&self, name: &str, rows: Vec<Vec<String>>) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.table_path(name);
        metrics::publish::table_written(rows.len());
        fs::write(&path, serde_json::to_string_pretty(&rows)?)?;
        debug!(table = name, rows = rows.len(), "table written");
        Ok(())
    }
}
