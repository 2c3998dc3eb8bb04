use std::sync::Arc;

use dexter_client::PokeApiClient;
use dexter_core::{IngestConfig, IngestionController, IngestionPipeline, TracingReporter};
use dexter_db::RecordRepository;

/// Controller over the HTTP fetchers and the SQLite store.
pub type Controller = IngestionController<PokeApiClient, PokeApiClient, RecordRepository>;

/// Shared application state for all handlers.
///
/// Cloned per request by Axum; the controller sits behind an `Arc` so every
/// clone sees the same run.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<Controller>,
}

impl AppState {
    /// Wires the client and repository into a controller that logs progress.
    pub fn new(client: PokeApiClient, repo: RecordRepository, config: IngestConfig) -> Self {
        let pipeline = IngestionPipeline::with_config(client.clone(), client, repo, config);
        Self {
            controller: Arc::new(IngestionController::with_reporter(
                pipeline,
                TracingReporter,
            )),
        }
    }
}
