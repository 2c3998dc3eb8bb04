//! Ingestion control endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::dto::{
    IngestStatusResponse, StartIngestRequest, StartIngestResponse, StopIngestResponse,
};
use crate::state::AppState;

/// Starts a run in the background and returns immediately.
///
/// 202 when a run was started, 200 with `started: false` when one was
/// already active. Poll GET /api/v1/ingest/status for progress.
pub async fn start_ingest(
    State(state): State<AppState>,
    Json(request): Json<StartIngestRequest>,
) -> (StatusCode, Json<StartIngestResponse>) {
    let max_pages = request
        .max_pages
        .unwrap_or_else(|| state.controller.default_max_pages());

    let started = state.controller.start(max_pages).await;
    let status = if started {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };

    (status, Json(StartIngestResponse { started, max_pages }))
}

/// Asks the active run to stop after its current page.
pub async fn stop_ingest(State(state): State<AppState>) -> Json<StopIngestResponse> {
    Json(StopIngestResponse {
        stopping: state.controller.stop(),
    })
}

/// Current run state plus the summary of the last finished run.
pub async fn get_ingest_status(State(state): State<AppState>) -> Json<IngestStatusResponse> {
    Json(state.controller.status().into())
}
