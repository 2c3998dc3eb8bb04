//! Health check endpoint.

use axum::{Json, extract::State};

use crate::dto::{HealthResponse, ServiceStatus};
use crate::state::AppState;

/// Returns the server version and whether the store answers a count query.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.controller.store().count().await {
        Ok(_) => ServiceStatus {
            healthy: true,
            message: None,
        },
        Err(e) => ServiceStatus {
            healthy: false,
            message: Some(e.user_message()),
        },
    };

    Json(HealthResponse {
        status: if database.healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    })
}
