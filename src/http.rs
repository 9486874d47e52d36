//! Thin request-handler boundary: routes, JSON envelopes, and the one place
//! failures become HTTP statuses.

use crate::errors::AppError;
use crate::service::{MutationRequest, Navigator};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub navigator: Arc<Navigator>,
}

pub fn router(navigator: Arc<Navigator>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/data", get(get_data).post(post_data))
        .with_state(AppState { navigator })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct MutationResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    appended: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<usize>,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn get_data(State(state): State<AppState>) -> Response {
    match state.navigator.dashboard().await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn post_data(
    State(state): State<AppState>,
    Json(request): Json<MutationRequest>,
) -> Response {
    match state.navigator.apply_mutation(&request).await {
        Ok(outcome) => {
            let body = MutationResponse {
                success: true,
                appended: outcome.map(|o| o.appended),
                failed: outcome.map(|o| o.failed),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(error: AppError) -> Response {
    let status = error_status(&error);
    tracing::error!(error = %error, status = %status, "request failed");
    (
        status,
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

fn error_status(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        AppError::StoreUnavailable(_) => StatusCode::BAD_GATEWAY,
        AppError::TableNotFound(_)
        | AppError::ConfigurationMissing(_)
        | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
