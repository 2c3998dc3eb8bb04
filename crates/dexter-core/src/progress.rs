//! Progress reporting for ingestion runs.
//!
//! The pipeline emits an [`IngestEvent`] at each step; what happens with it
//! is up to the [`ProgressReporter`] the caller passes in. The CLI and the
//! server log through [`TracingReporter`], tests use [`SilentReporter`].

use tracing::{debug, info, warn};

use crate::models::Reference;
use crate::summary::{PageStats, RunSummary};

// =============================================================================
// Ingest Events
// =============================================================================

/// Events emitted by the pipeline during a run.
#[derive(Debug, Clone)]
pub enum IngestEvent<'a> {
    /// Run started.
    RunStarted { max_pages: u32, concurrency: usize },
    /// A listing page was fetched; fan-out is about to begin.
    PageFetched {
        page: u32,
        cursor: Option<&'a Reference>,
        items: usize,
    },
    /// A single detail fetch failed; siblings continue.
    ItemFailed {
        reference: &'a Reference,
        error: &'a str,
    },
    /// A detail body had no usable id.
    ItemSkipped { reference: &'a Reference },
    /// A page's batch was committed to the store.
    PageCommitted {
        page: u32,
        upserted: u64,
        stats: &'a PageStats,
        next: Option<&'a Reference>,
    },
    /// A listing fetch or a page commit failed; the run ends.
    PageFailed { page: u32, error: &'a str },
    /// Run finished (completed, cancelled, or failed).
    RunFinished { summary: &'a RunSummary },
}

// =============================================================================
// Progress Reporter Trait
// =============================================================================

/// Trait for reporting ingestion progress.
pub trait ProgressReporter: Send + Sync {
    /// Called when an ingestion event occurs.
    ///
    /// The default implementation does nothing (silent mode).
    fn report(&self, event: IngestEvent<'_>) {
        let _ = event;
    }
}

/// Silent reporter that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Tracing-based reporter for CLI/server logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: IngestEvent<'_>) {
        match event {
            IngestEvent::RunStarted {
                max_pages,
                concurrency,
            } => {
                info!(max_pages, concurrency, "Ingestion started");
            }
            IngestEvent::PageFetched {
                page,
                cursor,
                items,
            } => {
                debug!(
                    page,
                    cursor = cursor.map(|c| c.url.as_str()).unwrap_or("<start>"),
                    items,
                    "Page fetched"
                );
            }
            IngestEvent::ItemFailed { reference, error } => {
                warn!(url = %reference.url, error, "Failed to fetch item, skipping");
            }
            IngestEvent::ItemSkipped { reference } => {
                debug!(url = %reference.url, "Item has no usable id, skipping");
            }
            IngestEvent::PageCommitted {
                page,
                upserted,
                stats,
                next,
            } => {
                info!(
                    page,
                    upserted,
                    skipped = stats.skipped,
                    failed = stats.failed,
                    more = next.is_some(),
                    "Page committed"
                );
            }
            IngestEvent::PageFailed { page, error } => {
                warn!(page, error, "Page failed, stopping run");
            }
            IngestEvent::RunFinished { summary } => {
                info!(
                    run_id = %summary.run_id,
                    status = %summary.status,
                    pages = summary.pages_processed,
                    upserted = summary.records_upserted,
                    pages_failed = summary.pages_failed,
                    items_failed = summary.items_failed,
                    items_skipped = summary.items_skipped,
                    "Ingestion finished"
                );
            }
        }
    }
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for &R {
    fn report(&self, event: IngestEvent<'_>) {
        (**self).report(event);
    }
}
