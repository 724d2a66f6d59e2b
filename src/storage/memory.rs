use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Result, SyncError};
use crate::tabular::Sheet;

use super::WorkbookStore;

/// In-memory workbook for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbookStore {
    tables: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
}

impl InMemoryWorkbookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a tab, replacing any previous contents.
    pub fn insert(&self, name: &str, rows: Vec<Vec<String>>) {
        self.tables.lock().unwrap().insert(name.to_string(), rows);
    }

    /// Snapshot of a tab's current contents, for assertions.
    pub fn get(&self, name: &str) -> Option<Vec<Vec<String>>> {
        self.tables.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl WorkbookStore for InMemoryWorkbookStore {
    async fn read_table(&self, name: &str) -> Result<Sheet> {
        self.read_table_opt(name)
            .await?
            .ok_or_else(|| SyncError::MissingSource(name.to_string()))
    }

    async fn read_table_opt(&self, name: &str) -> Result<Option<Sheet>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(name)
            .map(|rows| Sheet::new(name, rows.clone())))
    }

    async fn write_table(&self, name: &str, rows: Vec<Vec<String>>) -> Result<()> {
        self.tables.lock().unwrap().insert(name.to_string(), rows);
        Ok(())
    }
}
