use async_trait::async_trait;
use ssaa_navigator::errors::{AppError, AppResult};
use ssaa_navigator::models::Quadrant;
use ssaa_navigator::service::{MutationRequest, MutationTarget, Navigator};
use ssaa_navigator::store::{Row, RowStore, SqliteStore, EVALUATIONS_TABLE, HISTORY_TABLE};
use std::collections::BTreeMap;
use std::sync::Arc;

fn evaluation_row(id: &str, name: &str, ratings: [&str; 6], hours: &str) -> Row {
    Row::from([
        ("ProjectID".to_string(), id.to_string()),
        ("ProjectName".to_string(), name.to_string()),
        ("SS_Vision".to_string(), ratings[0].to_string()),
        ("SS_Resonance".to_string(), ratings[1].to_string()),
        ("SS_Context".to_string(), ratings[2].to_string()),
        ("VV_Market".to_string(), ratings[3].to_string()),
        ("VV_Speed".to_string(), ratings[4].to_string()),
        ("VV_Friction".to_string(), ratings[5].to_string()),
        ("Work_Hours".to_string(), hours.to_string()),
        ("Status".to_string(), "Green".to_string()),
        ("Actual_Profit".to_string(), "300".to_string()),
    ])
}

async fn seeded_store(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
    let store = SqliteStore::new(&dir.path().join("navigator.db")).expect("open store");
    store
        .append_row(
            EVALUATIONS_TABLE,
            &evaluation_row("P001", "Payments", ["5", "4", "5", "4", "5", "4"], "60"),
        )
        .await
        .expect("seed P001");
    store
        .append_row(
            EVALUATIONS_TABLE,
            &evaluation_row("P002", "Legacy rework", ["2", "2", "2", "1", "1", "1"], "40"),
        )
        .await
        .expect("seed P002");
    Arc::new(store)
}

fn updates(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn dashboard_reflects_an_evaluation_update() {
    let dir = tempfile::tempdir().expect("tempdir");
    let navigator = Navigator::new(seeded_store(&dir).await, 60.0);

    let view = navigator.dashboard().await.expect("dashboard");
    assert_eq!(view.projects.len(), 2);
    assert!((view.projects[0].sync - 94.0).abs() < 1e-9);
    assert_eq!(view.projects[0].quadrant, Quadrant::Star);
    assert_eq!(view.projects[1].quadrant, Quadrant::Stop);

    navigator
        .apply_mutation(&MutationRequest {
            target: MutationTarget::Evaluations,
            id: Some("P001".to_string()),
            updates: Some(updates(&[("visionScore", serde_json::json!(3))])),
        })
        .await
        .expect("update");

    let view = navigator.dashboard().await.expect("dashboard");
    let card = &view.projects[0];
    assert_eq!(card.evaluation.vision_score, 3);
    // (3*0.4 + 4*0.3 + 5*0.3) * 20
    assert!((card.sync - 78.0).abs() < 1e-9);
    assert_eq!(card.evaluation.name, "Payments");
    assert_eq!(card.evaluation.work_hours, 60.0);
}

#[tokio::test]
async fn out_of_range_ratings_never_reach_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let navigator = Navigator::new(seeded_store(&dir).await, 60.0);

    let err = navigator
        .apply_mutation(&MutationRequest {
            target: MutationTarget::Evaluations,
            id: Some("P001".to_string()),
            updates: Some(updates(&[("visionScore", serde_json::json!(9))])),
        })
        .await
        .expect_err("must fail");
    assert!(matches!(err, AppError::Validation(_)));

    let view = navigator.dashboard().await.expect("dashboard");
    assert_eq!(view.projects[0].evaluation.vision_score, 5);
}

#[tokio::test]
async fn settings_upsert_shows_up_in_the_dashboard() {
    let dir = tempfile::tempdir().expect("tempdir");
    let navigator = Navigator::new(seeded_store(&dir).await, 60.0);

    navigator
        .apply_mutation(&MutationRequest {
            target: MutationTarget::Settings,
            id: Some("Score_5_Def".to_string()),
            updates: Some(updates(&[("value", serde_json::json!("Category defining"))])),
        })
        .await
        .expect("insert");

    let view = navigator.dashboard().await.expect("dashboard");
    assert_eq!(view.settings["Score_5_Def"], "Category defining");
}

#[tokio::test]
async fn two_snapshots_append_two_full_row_sets() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = seeded_store(&dir).await;
    let navigator = Navigator::new(store.clone(), 60.0);

    let first = navigator
        .apply_mutation(&MutationRequest {
            target: MutationTarget::Snapshot,
            id: None,
            updates: None,
        })
        .await
        .expect("first snapshot")
        .expect("outcome");
    assert_eq!(first.appended, 2);
    assert_eq!(first.failed, 0);

    // Append-only by design: a second run duplicates the rows.
    let second = navigator.capture_snapshot().await.expect("second snapshot");
    assert_eq!(second.appended, 2);

    let history = store.list_all(HISTORY_TABLE).await.expect("history");
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn a_trail_appears_once_the_position_moves_past_the_noise_floor() {
    let dir = tempfile::tempdir().expect("tempdir");
    let navigator = Navigator::new(seeded_store(&dir).await, 60.0);

    navigator.capture_snapshot().await.expect("snapshot");

    let view = navigator.dashboard().await.expect("dashboard");
    assert_eq!(view.projects[0].trail, None, "no movement yet");
    let prior = view.history.get("P001").expect("captured position");
    assert!((prior.sync - 94.0).abs() < 1e-9);

    navigator
        .apply_mutation(&MutationRequest {
            target: MutationTarget::Evaluations,
            id: Some("P001".to_string()),
            updates: Some(updates(&[
                ("visionScore", serde_json::json!(2)),
                ("speedScore", serde_json::json!(2)),
            ])),
        })
        .await
        .expect("update");

    let view = navigator.dashboard().await.expect("dashboard");
    let trail = view.projects[0].trail.expect("trail");
    assert!((trail.from_sync - 94.0).abs() < 1e-9);
    assert!((trail.from_velocity - 88.0).abs() < 1e-9);
    assert!(trail.to_sync < trail.from_sync);
}

struct FlakyStore {
    inner: SqliteStore,
    poison_id: String,
}

#[async_trait]
impl RowStore for FlakyStore {
    async fn list_all(&self, table: &str) -> AppResult<Vec<Row>> {
        self.inner.list_all(table).await
    }

    async fn find_by_key(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
    ) -> AppResult<Option<Row>> {
        self.inner.find_by_key(table, key_column, key_value).await
    }

    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        updates: &Row,
    ) -> AppResult<()> {
        self.inner.update(table, key_column, key_value, updates).await
    }

    async fn append_row(&self, table: &str, values: &Row) -> AppResult<()> {
        if table == HISTORY_TABLE && values.get("ProjectID") == Some(&self.poison_id) {
            return Err(AppError::StoreUnavailable("synthetic outage".to_string()));
        }
        self.inner.append_row(table, values).await
    }
}

#[tokio::test]
async fn a_failed_append_is_counted_not_rolled_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inner = SqliteStore::new(&dir.path().join("navigator.db")).expect("open store");
    inner
        .append_row(
            EVALUATIONS_TABLE,
            &evaluation_row("P001", "Payments", ["5", "4", "5", "4", "5", "4"], "60"),
        )
        .await
        .expect("seed");
    inner
        .append_row(
            EVALUATIONS_TABLE,
            &evaluation_row("P002", "Legacy rework", ["2", "2", "2", "1", "1", "1"], "40"),
        )
        .await
        .expect("seed");

    let store = Arc::new(FlakyStore {
        inner,
        poison_id: "P002".to_string(),
    });
    let navigator = Navigator::new(store.clone(), 60.0);

    let outcome = navigator.capture_snapshot().await.expect("snapshot");
    assert_eq!(outcome.appended, 1);
    assert_eq!(outcome.failed, 1);

    let history = store.list_all(HISTORY_TABLE).await.expect("history");
    assert_eq!(history.len(), 1, "the successful append stays");
    assert_eq!(history[0]["ProjectID"], "P001");
}
