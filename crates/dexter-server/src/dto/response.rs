//! Response DTOs for API endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dexter_core::{IngestionState, Record, RunSummary};

// =============================================================================
// Health
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,
    pub version: String,
    pub database: ServiceStatus,
}

/// Status of an individual service component.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Records
// =============================================================================

/// Stored records, in id order.
#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    /// Number of records in the store, before any limit
    pub total: usize,
    pub records: Vec<Record>,
}

/// Result of clearing the store.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub removed: u64,
}

// =============================================================================
// Ingestion
// =============================================================================

/// Result of a start request.
#[derive(Debug, Serialize)]
pub struct StartIngestResponse {
    /// `false` when a run was already active and nothing changed
    pub started: bool,
    pub max_pages: u32,
}

/// Result of a stop request.
#[derive(Debug, Serialize)]
pub struct StopIngestResponse {
    /// `false` when nothing was running
    pub stopping: bool,
}

/// Current ingestion state.
#[derive(Debug, Serialize)]
pub struct IngestStatusResponse {
    pub running: bool,
    pub cancelled: bool,
    pub pages_processed: u32,
    /// URL of the next listing page, if a page has been committed
    pub cursor: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_run: Option<RunSummary>,
}

impl From<IngestionState> for IngestStatusResponse {
    fn from(state: IngestionState) -> Self {
        Self {
            running: state.running,
            cancelled: state.cancelled,
            pages_processed: state.pages_processed,
            cursor: state.cursor.map(|c| c.url),
            started_at: state.started_at,
            last_run: state.last_run,
        }
    }
}
