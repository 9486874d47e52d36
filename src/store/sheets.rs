//! Remote spreadsheet backend speaking the Sheets v4 values API. One round
//! trip per store operation; the first sheet row is the header row.

use crate::errors::{AppError, AppResult};
use crate::store::{Row, RowStore};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetsStore {
    http: reqwest::Client,
    spreadsheet_id: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

struct Grid {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SheetsStore {
    pub fn new(spreadsheet_id: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            spreadsheet_id,
            token,
        }
    }

    fn values_url(&self, suffix: &str) -> String {
        format!("{SHEETS_API_BASE}/{}/values/{suffix}", self.spreadsheet_id)
    }

    async fn get_values(&self, table: &str, range: &str) -> AppResult<Vec<Vec<String>>> {
        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = check_response(table, response).await?;
        let payload: ValueRange = response.json().await?;
        Ok(payload
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect())
    }

    async fn fetch_grid(&self, table: &str) -> AppResult<Grid> {
        let mut values = self.get_values(table, table).await?;
        if values.is_empty() {
            return Err(AppError::TableNotFound(format!("{table} has no header row")));
        }
        let headers = values.remove(0);
        Ok(Grid {
            headers,
            rows: values,
        })
    }

    async fn fetch_headers(&self, table: &str) -> AppResult<Vec<String>> {
        let mut values = self.get_values(table, &format!("{table}!1:1")).await?;
        if values.is_empty() {
            return Err(AppError::TableNotFound(format!("{table} has no header row")));
        }
        Ok(values.remove(0))
    }

    async fn put_row(&self, table: &str, sheet_row: usize, cells: &[String]) -> AppResult<()> {
        let range = format!(
            "{table}!A{sheet_row}:{}{sheet_row}",
            column_letter(cells.len().saturating_sub(1))
        );
        let response = self
            .http
            .put(self.values_url(&range))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "values": [cells] }))
            .send()
            .await?;
        check_response(table, response).await?;
        Ok(())
    }
}

#[async_trait]
impl RowStore for SheetsStore {
    async fn list_all(&self, table: &str) -> AppResult<Vec<Row>> {
        let grid = self.fetch_grid(table).await?;
        Ok(grid
            .rows
            .iter()
            .map(|cells| cells_to_row(&grid.headers, cells))
            .collect())
    }

    async fn find_by_key(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
    ) -> AppResult<Option<Row>> {
        let grid = self.fetch_grid(table).await?;
        let key_index = header_index(table, &grid.headers, key_column)?;
        Ok(grid
            .rows
            .iter()
            .find(|cells| cells.get(key_index).map(String::as_str) == Some(key_value))
            .map(|cells| cells_to_row(&grid.headers, cells)))
    }

    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        updates: &Row,
    ) -> AppResult<()> {
        let grid = self.fetch_grid(table).await?;
        let key_index = header_index(table, &grid.headers, key_column)?;
        let position = grid
            .rows
            .iter()
            .position(|cells| cells.get(key_index).map(String::as_str) == Some(key_value))
            .ok_or_else(|| {
                AppError::RecordNotFound(format!("{table} row with {key_column} = {key_value}"))
            })?;

        let cells = apply_updates(table, &grid.headers, &grid.rows[position], updates)?;
        // Header row is sheet row 1, data starts at 2.
        self.put_row(table, position + 2, &cells).await
    }

    async fn append_row(&self, table: &str, values: &Row) -> AppResult<()> {
        let headers = self.fetch_headers(table).await?;
        let cells = row_to_cells(&headers, values);
        let response = self
            .http
            .post(self.values_url(&format!("{table}:append")))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "values": [cells] }))
            .send()
            .await?;
        check_response(table, response).await?;
        Ok(())
    }
}

async fn check_response(table: &str, response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND || body.contains("Unable to parse range") {
        return Err(AppError::TableNotFound(table.to_string()));
    }
    let detail: String = body.chars().take(300).collect();
    Err(AppError::StoreUnavailable(format!(
        "sheets api returned {status}: {detail}"
    )))
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// 0-based column index to A1 letters: 0 -> A, 25 -> Z, 26 -> AA.
fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn header_index(table: &str, headers: &[String], column: &str) -> AppResult<usize> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| AppError::Internal(format!("sheet {table} has no column {column}")))
}

/// The API trims trailing empty cells, so short rows pad out with "".
fn cells_to_row(headers: &[String], cells: &[String]) -> Row {
    headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            (
                header.clone(),
                cells.get(index).cloned().unwrap_or_default(),
            )
        })
        .collect()
}

fn row_to_cells(headers: &[String], values: &Row) -> Vec<String> {
    headers
        .iter()
        .map(|header| values.get(header).cloned().unwrap_or_default())
        .collect()
}

fn apply_updates(
    table: &str,
    headers: &[String],
    cells: &[String],
    updates: &Row,
) -> AppResult<Vec<String>> {
    let mut updated: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(index, _)| cells.get(index).cloned().unwrap_or_default())
        .collect();
    for (column, value) in updates {
        let index = header_index(table, headers, column)?;
        updated[index] = value.clone();
    }
    Ok(updated)
}
