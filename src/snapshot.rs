//! Batch capture of the current evaluation table into the append-only
//! history table. The store offers no transaction boundary, so a failed
//! append never rolls back earlier ones; the outcome reports both counts.

use crate::errors::AppResult;
use crate::models::columns;
use crate::store::{Row, RowStore, EVALUATIONS_TABLE, HISTORY_TABLE};
use serde::Serialize;

/// Rating, hours, and financial columns carried into each history row.
const CARRIED_COLUMNS: [&str; 11] = [
    columns::SS_VISION,
    columns::SS_RESONANCE,
    columns::SS_CONTEXT,
    columns::VV_MARKET,
    columns::VV_SPEED,
    columns::VV_FRICTION,
    columns::WORK_HOURS,
    columns::TARGET_REVENUE,
    columns::ACTUAL_REVENUE,
    columns::TARGET_PROFIT,
    columns::ACTUAL_PROFIT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotOutcome {
    pub appended: usize,
    pub failed: usize,
}

pub async fn capture(store: &dyn RowStore, capture_date: &str) -> AppResult<SnapshotOutcome> {
    let rows = store.list_all(EVALUATIONS_TABLE).await?;
    let mut outcome = SnapshotOutcome {
        appended: 0,
        failed: 0,
    };
    for row in &rows {
        let history = history_row(row, capture_date);
        match store.append_row(HISTORY_TABLE, &history).await {
            Ok(()) => outcome.appended += 1,
            Err(err) => {
                let project_id = history
                    .get(columns::PROJECT_ID)
                    .map(String::as_str)
                    .unwrap_or("");
                tracing::warn!(project_id, error = %err, "history append failed");
                outcome.failed += 1;
            }
        }
    }
    tracing::info!(
        appended = outcome.appended,
        failed = outcome.failed,
        capture_date,
        "snapshot captured"
    );
    Ok(outcome)
}

fn history_row(evaluation: &Row, capture_date: &str) -> Row {
    let mut row = Row::new();
    row.insert(
        columns::PROJECT_ID.to_string(),
        evaluation
            .get(columns::PROJECT_ID)
            .cloned()
            .unwrap_or_default(),
    );
    row.insert(columns::CAPTURE_DATE.to_string(), capture_date.to_string());
    for column in CARRIED_COLUMNS {
        if column == columns::WORK_HOURS && !evaluation.contains_key(column) {
            if let Some(hours) = evaluation.get(columns::ASSET_VOLUME) {
                row.insert(columns::WORK_HOURS.to_string(), hours.clone());
            }
            continue;
        }
        if let Some(value) = evaluation.get(column) {
            row.insert(column.to_string(), value.clone());
        }
    }
    row
}
