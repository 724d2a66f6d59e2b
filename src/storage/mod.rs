//! Workbook access boundary.
//!
//! The pipeline core is pure; everything it reads or publishes goes through
//! this trait. The production deployment fronts a spreadsheet service, but
//! the core only ever sees named grids, so a directory of JSON grids (or an
//! in-memory map, for tests) honors the same contract.

pub mod json_store;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::tabular::Sheet;

pub use json_store::JsonWorkbookStore;
pub use memory::InMemoryWorkbookStore;

#[async_trait]
pub trait WorkbookStore: Send + Sync {
    /// Reads a required tab. Absence is a `MissingSource` error.
    async fn read_table(&self, name: &str) -> Result<Sheet>;

    /// Reads an optional tab; `None` when absent.
    async fn read_table_opt(&self, name: &str) -> Result<Option<Sheet>>;

    /// Replaces a tab's contents wholesale, creating it when absent.
    async fn write_table(&self, name: &str, rows: Vec<Vec<String>>) -> Result<()>;
}
