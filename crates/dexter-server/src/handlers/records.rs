//! Stored record endpoints.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::dto::{ListRecordsQuery, RecordsResponse, ResetResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Lists stored records in id order, optionally truncated to `limit`.
pub async fn list_records(
    State(state): State<AppState>,
    Query(params): Query<ListRecordsQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let mut records = state.controller.store().list_all().await?;
    let total = records.len();

    if let Some(limit) = params.limit {
        records.truncate(limit);
    }

    Ok(Json(RecordsResponse { total, records }))
}

/// Clears the store.
///
/// Answers 409 while a run is active; the store is left untouched.
pub async fn reset_records(State(state): State<AppState>) -> Result<Json<ResetResponse>, ApiError> {
    let removed = state.controller.reset().await?;
    Ok(Json(ResetResponse { removed }))
}
