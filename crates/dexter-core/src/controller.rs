//! Run lifecycle for the ingestion pipeline.
//!
//! [`IngestionController`] is the surface a UI layer talks to. It owns the
//! pipeline, the cancellation token of the active run, and the shared
//! [`IngestionState`].
//!
//! # Rules
//!
//! - At most one run at a time: `start` while running is a no-op.
//! - `stop` is cooperative. The run notices it at the next page boundary and
//!   keeps every page it already committed.
//! - `reset` clears the store and is refused while a run is active.
//!
//! # Example
//!
//! ```ignore
//! let controller = IngestionController::with_reporter(pipeline, TracingReporter);
//! controller.start(60).await;
//! // ...
//! controller.stop();
//! let summary = controller.wait().await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::IngestionState;
use crate::pipeline::IngestionPipeline;
use crate::progress::{IngestEvent, ProgressReporter, SilentReporter};
use crate::summary::RunSummary;
use crate::traits::{DetailFetcher, PageFetcher, RecordStore};

/// State shared between the controller and its running task.
#[derive(Default)]
struct Shared {
    state: IngestionState,
    cancel_token: Option<CancellationToken>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reporter wrapper that keeps [`IngestionState`] current as pages commit.
struct StateTracker {
    shared: Arc<Mutex<Shared>>,
    inner: Arc<dyn ProgressReporter>,
}

impl ProgressReporter for StateTracker {
    fn report(&self, event: IngestEvent<'_>) {
        if let IngestEvent::PageCommitted { page, next, .. } = &event {
            let mut shared = lock(&self.shared);
            shared.state.pages_processed = *page;
            shared.state.cursor = next.cloned();
        }
        self.inner.report(event);
    }
}

/// Ends the run in the shared state when the run task finishes.
///
/// Dropped without [`RunGuard::complete`] only when the task panicked or was
/// aborted; the state is still cleared so later runs can start.
struct RunGuard {
    shared: Option<Arc<Mutex<Shared>>>,
}

impl RunGuard {
    fn new(shared: Arc<Mutex<Shared>>) -> Self {
        Self {
            shared: Some(shared),
        }
    }

    fn complete(mut self, summary: RunSummary) {
        if let Some(shared) = self.shared.take() {
            end_run(&shared, Some(summary));
        }
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            warn!("Ingestion task ended without a summary");
            end_run(&shared, None);
        }
    }
}

fn end_run(shared: &Mutex<Shared>, summary: Option<RunSummary>) {
    let mut shared = lock(shared);
    shared.state.reset();
    if summary.is_some() {
        shared.state.last_run = summary;
    }
    shared.cancel_token = None;
}

/// Exposes start/stop/reset/status over an [`IngestionPipeline`].
pub struct IngestionController<P, D, S>
where
    P: PageFetcher,
    D: DetailFetcher,
    S: RecordStore,
{
    pipeline: Arc<IngestionPipeline<P, D, S>>,
    shared: Arc<Mutex<Shared>>,
    /// Held across start/reset so they never interleave.
    lifecycle: tokio::sync::Mutex<()>,
    /// Task of the most recent run, until someone joins it.
    handle: tokio::sync::Mutex<Option<JoinHandle<RunSummary>>>,
    reporter: Arc<dyn ProgressReporter>,
}

impl<P, D, S> IngestionController<P, D, S>
where
    P: PageFetcher + 'static,
    D: DetailFetcher + 'static,
    S: RecordStore + 'static,
{
    pub fn new(pipeline: IngestionPipeline<P, D, S>) -> Self {
        Self::with_reporter(pipeline, SilentReporter)
    }

    /// Creates a controller whose runs report progress to `reporter`.
    pub fn with_reporter<R>(pipeline: IngestionPipeline<P, D, S>, reporter: R) -> Self
    where
        R: ProgressReporter + 'static,
    {
        Self {
            pipeline: Arc::new(pipeline),
            shared: Arc::new(Mutex::new(Shared::default())),
            lifecycle: tokio::sync::Mutex::new(()),
            handle: tokio::sync::Mutex::new(None),
            reporter: Arc::new(reporter),
        }
    }

    /// The store the pipeline writes to, for read access such as `list_all`.
    pub fn store(&self) -> &S {
        self.pipeline.store()
    }

    /// Page limit used when the caller does not pick one.
    pub fn default_max_pages(&self) -> u32 {
        self.pipeline.config().max_pages
    }

    /// Starts a run in the background.
    ///
    /// Returns `false` without doing anything if a run is already active.
    pub async fn start(&self, max_pages: u32) -> bool {
        let _lifecycle = self.lifecycle.lock().await;

        let cancel_token = CancellationToken::new();
        {
            let mut shared = lock(&self.shared);
            if shared.state.running {
                info!("Ingestion already running, ignoring start");
                return false;
            }
            shared.state.reset();
            shared.state.running = true;
            shared.state.started_at = Some(Utc::now());
            shared.cancel_token = Some(cancel_token.clone());
        }

        let pipeline = Arc::clone(&self.pipeline);
        let guard = RunGuard::new(Arc::clone(&self.shared));
        let tracker = StateTracker {
            shared: Arc::clone(&self.shared),
            inner: Arc::clone(&self.reporter),
        };

        let handle = tokio::spawn(async move {
            let summary = pipeline
                .run_with_progress(max_pages, &cancel_token, &tracker)
                .await;

            guard.complete(summary.clone());
            summary
        });

        *self.handle.lock().await = Some(handle);
        true
    }

    /// Requests cancellation of the active run.
    ///
    /// Returns `false` if nothing was running.
    pub fn stop(&self) -> bool {
        let mut shared = lock(&self.shared);
        if !shared.state.running {
            return false;
        }
        shared.state.cancelled = true;
        if let Some(token) = &shared.cancel_token {
            token.cancel();
        }
        info!("Stop requested, finishing current page");
        true
    }

    /// Clears the store.
    ///
    /// Fails with [`AppError::InvalidState`] while a run is active; the store
    /// is left untouched in that case. Returns the number of removed records.
    pub async fn reset(&self) -> Result<u64, AppError> {
        let _lifecycle = self.lifecycle.lock().await;

        let running = lock(&self.shared).state.running;
        if running {
            return Err(AppError::InvalidState(
                "cannot reset while ingestion is running".to_string(),
            ));
        }

        let removed = self.pipeline.store().clear().await?;
        lock(&self.shared).state.reset();
        info!(removed, "Store cleared");
        Ok(removed)
    }

    /// Snapshot of the current state.
    pub fn status(&self) -> IngestionState {
        lock(&self.shared).state.clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared).state.running
    }

    /// Waits for the active run to finish and returns its summary.
    ///
    /// With no active run, returns the summary of the last finished run.
    /// Cancel-safe: dropping the future leaves the run joinable.
    pub async fn wait(&self) -> Option<RunSummary> {
        let mut slot = self.handle.lock().await;
        let Some(handle) = slot.as_mut() else {
            return self.status().last_run;
        };

        let joined = handle.await;
        *slot = None;

        match joined {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %e, "Ingestion task ended abnormally");
                self.status().last_run
            }
        }
    }
}
