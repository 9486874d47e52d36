//! Dashboard view assembly: a pure function from raw store rows to the
//! serializable payload the presentation layer renders. Keeping this free of
//! I/O makes the whole read path testable without a store or a renderer.

use crate::history::{self, AxisPosition, Trail};
use crate::models::{columns, ProjectEvaluation, Quadrant};
use crate::score;
use crate::store::Row;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    #[serde(flatten)]
    pub evaluation: ProjectEvaluation,
    pub sync: f64,
    pub velocity: f64,
    pub quadrant: Quadrant,
    pub asset_share: f64,
    pub return_on_hours: f64,
    pub trail: Option<Trail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub projects: Vec<ProjectCard>,
    pub settings: BTreeMap<String, String>,
    pub history: BTreeMap<String, AxisPosition>,
}

pub fn assemble(
    evaluation_rows: &[Row],
    settings_rows: &[Row],
    history_rows: &[Row],
    threshold: f64,
) -> DashboardView {
    let evaluations: Vec<ProjectEvaluation> = evaluation_rows
        .iter()
        .map(ProjectEvaluation::from_row)
        .filter(|evaluation| !evaluation.id.is_empty())
        .collect();

    let settings = settings_rows
        .iter()
        .filter_map(|row| {
            let key = row.get(columns::SETTINGS_KEY)?.trim();
            if key.is_empty() {
                return None;
            }
            let value = row
                .get(columns::SETTINGS_VALUE)
                .cloned()
                .unwrap_or_default();
            Some((key.to_string(), value))
        })
        .collect();

    let history = latest_positions(history_rows);
    let shares = score::asset_share(&evaluations);

    let projects = evaluations
        .into_iter()
        .map(|evaluation| {
            let (sync, velocity) = score::compute_axes(&evaluation);
            let quadrant = score::classify(sync, velocity, threshold);
            let asset_share = shares.get(&evaluation.id).copied().unwrap_or(0.0);
            let return_on_hours = score::return_on_hours(&evaluation);
            let trail = history::delta(
                AxisPosition { sync, velocity },
                history.get(&evaluation.id).copied(),
            );
            ProjectCard {
                evaluation,
                sync,
                velocity,
                quadrant,
                asset_share,
                return_on_hours,
                trail,
            }
        })
        .collect();

    DashboardView {
        projects,
        settings,
        history,
    }
}

/// Newest captured position per project id. Capture dates are ISO `Y-m-d`
/// strings, so lexicographic comparison orders them; ties fall to the later
/// row, matching append order.
fn latest_positions(history_rows: &[Row]) -> BTreeMap<String, AxisPosition> {
    let mut newest: BTreeMap<String, (&str, &Row)> = BTreeMap::new();
    for row in history_rows {
        let Some(id) = row.get(columns::PROJECT_ID) else {
            continue;
        };
        if id.is_empty() {
            continue;
        }
        let date = row
            .get(columns::CAPTURE_DATE)
            .map(String::as_str)
            .unwrap_or("");
        let replace = match newest.get(id) {
            Some((kept_date, _)) => *kept_date <= date,
            None => true,
        };
        if replace {
            newest.insert(id.clone(), (date, row));
        }
    }

    newest
        .into_iter()
        .map(|(id, (_, row))| {
            let snapshot = ProjectEvaluation::from_row(row);
            let (sync, velocity) = score::compute_axes(&snapshot);
            (id, AxisPosition { sync, velocity })
        })
        .collect()
}
