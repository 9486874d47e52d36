//! Orchestration over the row store: assembles the dashboard read, validates
//! and applies mutations, and runs the snapshot batch.

use crate::errors::{AppError, AppResult};
use crate::models::{columns, Status, Verdict, EVALUATION_FIELD_COLUMNS, RATING_FIELDS};
use crate::snapshot::{self, SnapshotOutcome};
use crate::store::{Row, RowStore, EVALUATIONS_TABLE, HISTORY_TABLE, SETTINGS_TABLE};
use crate::view::{self, DashboardView};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MutationTarget {
    Evaluations,
    Settings,
    Snapshot,
}

#[derive(Debug, Deserialize)]
pub struct MutationRequest {
    pub target: MutationTarget,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub updates: Option<BTreeMap<String, serde_json::Value>>,
}

pub struct Navigator {
    store: Arc<dyn RowStore>,
    quadrant_threshold: f64,
}

impl Navigator {
    pub fn new(store: Arc<dyn RowStore>, quadrant_threshold: f64) -> Self {
        Self {
            store,
            quadrant_threshold,
        }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardView> {
        let evaluations = self.store.list_all(EVALUATIONS_TABLE).await?;
        let settings = optional_table(self.store.list_all(SETTINGS_TABLE).await)?;
        let history = optional_table(self.store.list_all(HISTORY_TABLE).await)?;
        Ok(view::assemble(
            &evaluations,
            &settings,
            &history,
            self.quadrant_threshold,
        ))
    }

    /// Dispatches a `POST /data` mutation. Snapshot runs ignore `id` and
    /// `updates` and report their append counts.
    pub async fn apply_mutation(
        &self,
        request: &MutationRequest,
    ) -> AppResult<Option<SnapshotOutcome>> {
        match request.target {
            MutationTarget::Evaluations => {
                let id = required_id(request)?;
                let updates = request.updates.as_ref().filter(|u| !u.is_empty()).ok_or_else(|| {
                    AppError::Validation("updates are required for Evaluations".to_string())
                })?;
                self.update_evaluation(id, updates).await?;
                Ok(None)
            }
            MutationTarget::Settings => {
                let key = required_id(request)?;
                let value = request
                    .updates
                    .as_ref()
                    .and_then(|updates| updates.get("value"))
                    .ok_or_else(|| {
                        AppError::Validation("updates.value is required for Settings".to_string())
                    })?;
                let value = scalar_text("value", value)?;
                self.update_setting(key, &value).await?;
                Ok(None)
            }
            MutationTarget::Snapshot => self.capture_snapshot().await.map(Some),
        }
    }

    pub async fn update_evaluation(
        &self,
        id: &str,
        updates: &BTreeMap<String, serde_json::Value>,
    ) -> AppResult<()> {
        let row = validate_evaluation_updates(updates)?;
        self.store
            .update(EVALUATIONS_TABLE, columns::PROJECT_ID, id, &row)
            .await?;
        tracing::info!(project_id = id, fields = row.len(), "evaluation updated");
        Ok(())
    }

    /// Settings entries come into existence on first write; evaluations never
    /// do. The asymmetry is deliberate and mirrored by the wire contract.
    pub async fn update_setting(&self, key: &str, value: &str) -> AppResult<()> {
        let updates = Row::from([(columns::SETTINGS_VALUE.to_string(), value.to_string())]);
        match self
            .store
            .update(SETTINGS_TABLE, columns::SETTINGS_KEY, key, &updates)
            .await
        {
            Err(AppError::RecordNotFound(_)) => {
                let row = Row::from([
                    (columns::SETTINGS_KEY.to_string(), key.to_string()),
                    (columns::SETTINGS_VALUE.to_string(), value.to_string()),
                ]);
                self.store.append_row(SETTINGS_TABLE, &row).await?;
                tracing::info!(key, "setting created");
                Ok(())
            }
            Ok(()) => {
                tracing::info!(key, "setting updated");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn capture_snapshot(&self) -> AppResult<SnapshotOutcome> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        snapshot::capture(self.store.as_ref(), &today).await
    }
}

fn required_id(request: &MutationRequest) -> AppResult<&str> {
    request
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("id is required".to_string()))
}

/// A read that tolerates a workbook without the optional tables; the
/// evaluations table itself stays mandatory.
fn optional_table(result: AppResult<Vec<Row>>) -> AppResult<Vec<Row>> {
    match result {
        Err(AppError::TableNotFound(table)) => {
            tracing::warn!(table, "optional table missing, treating as empty");
            Ok(Vec::new())
        }
        other => other,
    }
}

fn validate_evaluation_updates(
    updates: &BTreeMap<String, serde_json::Value>,
) -> AppResult<Row> {
    let mut row = Row::new();
    for (field, value) in updates {
        let column = EVALUATION_FIELD_COLUMNS
            .get(field.as_str())
            .ok_or_else(|| AppError::Validation(format!("unknown field: {field}")))?;
        let text = scalar_text(field, value)?;

        if RATING_FIELDS.contains(&field.as_str()) {
            let rating = parse_numeric(field, &text)?;
            if !(1.0..=5.0).contains(&rating) || rating.fract() != 0.0 {
                return Err(AppError::Validation(format!(
                    "{field} must be an integer between 1 and 5"
                )));
            }
        } else if field == "workHours" {
            let hours = parse_numeric(field, &text)?;
            if hours < 0.0 {
                return Err(AppError::Validation(format!("{field} must be >= 0")));
            }
        } else if field == "status" {
            Status::parse(&text)
                .ok_or_else(|| AppError::Validation(format!("invalid status: {text}")))?;
        } else if field == "verdict" {
            Verdict::parse(&text)
                .ok_or_else(|| AppError::Validation(format!("invalid verdict: {text}")))?;
        }

        row.insert((*column).to_string(), text);
    }
    Ok(row)
}

fn parse_numeric(field: &str, text: &str) -> AppResult<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("{field} must be a number")))
}

fn scalar_text(field: &str, value: &serde_json::Value) -> AppResult<String> {
    match value {
        serde_json::Value::String(text) => Ok(text.clone()),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(whole) => Ok(whole.to_string()),
            None => Ok(number.to_string()),
        },
        _ => Err(AppError::Validation(format!(
            "{field} must be a string or number"
        ))),
    }
}
