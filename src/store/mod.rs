//! The row-store seam: everything above this module sees the backing
//! spreadsheet-like datastore as ordered tables of column-name -> string-value
//! rows, reachable through four operations. Failures are terminal per
//! request; no backend retries.

mod sheets;
mod sqlite;

pub use sheets::SheetsStore;
pub use sqlite::SqliteStore;

use crate::errors::AppResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

pub const EVALUATIONS_TABLE: &str = "Evaluations";
pub const SETTINGS_TABLE: &str = "Settings";
pub const HISTORY_TABLE: &str = "History";

pub type Row = BTreeMap<String, String>;

#[async_trait]
pub trait RowStore: Send + Sync {
    /// All rows of `table` in underlying row order. The order is whatever the
    /// backend keeps, not semantically meaningful.
    async fn list_all(&self, table: &str) -> AppResult<Vec<Row>>;

    /// First row whose `key_column` cell equals `key_value`, if any.
    async fn find_by_key(&self, table: &str, key_column: &str, key_value: &str)
        -> AppResult<Option<Row>>;

    /// Rewrites only the listed columns on the matched row. Update-only:
    /// fails with `RecordNotFound` when no row matches, never auto-creates.
    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        updates: &Row,
    ) -> AppResult<()>;

    /// Appends one row; columns absent from `values` are left empty.
    async fn append_row(&self, table: &str, values: &Row) -> AppResult<()>;
}
