//! Local workbook backend: the same tables the remote spreadsheet carries,
//! kept in a sqlite file for development and tests.

use crate::errors::{AppError, AppResult};
use crate::store::{Row, RowStore};
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }
}

/// Table and column names get spliced into SQL, so they are restricted to
/// the identifier alphabet the schema uses.
fn check_identifier(name: &str) -> AppResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid identifier: {name:?}")))
    }
}

fn table_error(table: &str, error: rusqlite::Error) -> AppError {
    if error.to_string().contains("no such table") {
        AppError::TableNotFound(table.to_string())
    } else {
        AppError::from(error)
    }
}

fn map_row(column_names: &[String], row: &rusqlite::Row<'_>) -> AppResult<Row> {
    let mut mapped = Row::new();
    for (index, column) in column_names.iter().enumerate() {
        let value: Option<String> = row.get(index)?;
        mapped.insert(column.clone(), value.unwrap_or_default());
    }
    Ok(mapped)
}

#[async_trait]
impl RowStore for SqliteStore {
    async fn list_all(&self, table: &str) -> AppResult<Vec<Row>> {
        check_identifier(table)?;
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT * FROM \"{table}\" ORDER BY rowid"))
            .map_err(|err| table_error(table, err))?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|name| name.to_string()).collect();
        let mut rows = stmt.query([])?;
        let mut mapped = Vec::new();
        while let Some(row) = rows.next()? {
            mapped.push(map_row(&column_names, row)?);
        }
        Ok(mapped)
    }

    async fn find_by_key(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
    ) -> AppResult<Option<Row>> {
        check_identifier(table)?;
        check_identifier(key_column)?;
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT * FROM \"{table}\" WHERE \"{key_column}\" = ?1 LIMIT 1"
            ))
            .map_err(|err| table_error(table, err))?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|name| name.to_string()).collect();
        let mut rows = stmt.query([key_value])?;
        match rows.next()? {
            Some(row) => Ok(Some(map_row(&column_names, row)?)),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        updates: &Row,
    ) -> AppResult<()> {
        check_identifier(table)?;
        check_identifier(key_column)?;
        if updates.is_empty() {
            return Err(AppError::Validation("no fields to update".to_string()));
        }
        for column in updates.keys() {
            check_identifier(column)?;
        }

        let assignments = updates
            .keys()
            .enumerate()
            .map(|(index, column)| format!("\"{column}\" = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE \"{table}\" SET {assignments} WHERE \"{key_column}\" = ?{}",
            updates.len() + 1
        );

        let conn = self.lock()?;
        let changed = conn
            .execute(
                &sql,
                params_from_iter(updates.values().map(String::as_str).chain([key_value])),
            )
            .map_err(|err| table_error(table, err))?;
        if changed == 0 {
            return Err(AppError::RecordNotFound(format!(
                "{table} row with {key_column} = {key_value}"
            )));
        }
        Ok(())
    }

    async fn append_row(&self, table: &str, values: &Row) -> AppResult<()> {
        check_identifier(table)?;
        if values.is_empty() {
            return Err(AppError::Validation("no columns to append".to_string()));
        }
        for column in values.keys() {
            check_identifier(column)?;
        }

        let columns = values
            .keys()
            .map(|column| format!("\"{column}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=values.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO \"{table}\" ({columns}) VALUES ({placeholders})");

        let conn = self.lock()?;
        conn.execute(&sql, params_from_iter(values.values().map(String::as_str)))
            .map_err(|err| table_error(table, err))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteStore;
    use crate::errors::AppError;
    use crate::store::{Row, RowStore, EVALUATIONS_TABLE, SETTINGS_TABLE};

    fn evaluation_row(id: &str, vision: &str) -> Row {
        Row::from([
            ("ProjectID".to_string(), id.to_string()),
            ("ProjectName".to_string(), format!("Project {id}")),
            ("SS_Vision".to_string(), vision.to_string()),
            ("Work_Hours".to_string(), "40".to_string()),
        ])
    }

    #[tokio::test]
    async fn update_then_find_round_trips_and_leaves_other_fields_alone() {
        let store = SqliteStore::in_memory().expect("open store");
        store
            .append_row(EVALUATIONS_TABLE, &evaluation_row("P001", "2"))
            .await
            .expect("seed");

        store
            .update(
                EVALUATIONS_TABLE,
                "ProjectID",
                "P001",
                &Row::from([("SS_Vision".to_string(), "3".to_string())]),
            )
            .await
            .expect("update");

        let row = store
            .find_by_key(EVALUATIONS_TABLE, "ProjectID", "P001")
            .await
            .expect("find")
            .expect("row exists");
        assert_eq!(row["SS_Vision"], "3");
        assert_eq!(row["ProjectName"], "Project P001");
        assert_eq!(row["Work_Hours"], "40");
    }

    #[tokio::test]
    async fn update_of_a_missing_row_is_record_not_found() {
        let store = SqliteStore::in_memory().expect("open store");
        let err = store
            .update(
                EVALUATIONS_TABLE,
                "ProjectID",
                "ghost",
                &Row::from([("SS_Vision".to_string(), "3".to_string())]),
            )
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn list_all_preserves_insertion_order() {
        let store = SqliteStore::in_memory().expect("open store");
        for id in ["P003", "P001", "P002"] {
            store
                .append_row(EVALUATIONS_TABLE, &evaluation_row(id, "1"))
                .await
                .expect("seed");
        }
        let ids: Vec<String> = store
            .list_all(EVALUATIONS_TABLE)
            .await
            .expect("list")
            .into_iter()
            .map(|row| row["ProjectID"].clone())
            .collect();
        assert_eq!(ids, vec!["P003", "P001", "P002"]);
    }

    #[tokio::test]
    async fn unknown_table_is_table_not_found() {
        let store = SqliteStore::in_memory().expect("open store");
        let err = store.list_all("Nonsense").await.expect_err("must fail");
        assert!(matches!(err, AppError::TableNotFound(_)));
    }

    #[tokio::test]
    async fn hostile_identifiers_are_rejected() {
        let store = SqliteStore::in_memory().expect("open store");
        let err = store
            .list_all("Evaluations\"; DROP TABLE \"Settings")
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::Validation(_)));

        let err = store
            .find_by_key(SETTINGS_TABLE, "Key OR 1=1", "x")
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::Validation(_)));
    }
}
