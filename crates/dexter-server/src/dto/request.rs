//! Request DTOs for API endpoints.

use serde::Deserialize;

/// Query parameters for listing stored records.
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsQuery {
    /// Maximum number of records to return (all when absent)
    pub limit: Option<usize>,
}

/// Request body for starting an ingestion run.
#[derive(Debug, Default, Deserialize)]
pub struct StartIngestRequest {
    /// Page limit for this run (server default when absent)
    #[serde(default)]
    pub max_pages: Option<u32>,
}
