//! Bounded paginated ingestion.
//!
//! [`IngestionPipeline`] walks the upstream listing one page at a time,
//! fans out detail fetches for the page's references, and commits the
//! page's records to the store as a single batch before moving on.
//!
//! # Flow
//!
//! ```text
//! cursor = None
//! while pages < max_pages && !cancelled {
//!     page    = PageFetcher::fetch_page(cursor)        // error => run fails
//!     records = fan-out DetailFetcher::fetch_detail     // per-item errors isolated
//!     RecordStore::upsert_batch(records)               // error => run fails
//!     cursor  = page.next                              // None => exhausted
//! }
//! ```
//!
//! # Guarantees
//!
//! - Pages are strictly sequential: page N+1 is not requested before page N
//!   is committed.
//! - At most `concurrency` detail fetches are in flight at once. Every item's
//!   result is collected; one failure never cancels its siblings.
//! - Cancellation is observed only between pages. An in-flight page always
//!   finishes its fan-out and commit.
//! - A failed listing fetch commits nothing from that page.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::IngestConfig;
use crate::error::AppError;
use crate::models::{Record, Reference};
use crate::progress::{IngestEvent, ProgressReporter, SilentReporter};
use crate::summary::{ItemOutcome, PageStats, RunStatus, RunSummary};
use crate::traits::{DetailFetcher, PageFetcher, RecordStore};

/// Orchestrates page fetching, detail fan-out and per-page commits.
///
/// Generic over the three collaborator traits so that the same loop runs
/// against the HTTP client and SQLite in production and against mocks in tests.
pub struct IngestionPipeline<P, D, S>
where
    P: PageFetcher,
    D: DetailFetcher,
    S: RecordStore,
{
    pages: P,
    details: D,
    store: S,
    config: IngestConfig,
}

impl<P, D, S> IngestionPipeline<P, D, S>
where
    P: PageFetcher,
    D: DetailFetcher,
    S: RecordStore,
{
    /// Creates a pipeline with the default [`IngestConfig`].
    pub fn new(pages: P, details: D, store: S) -> Self {
        Self::with_config(pages, details, store, IngestConfig::default())
    }

    pub fn with_config(pages: P, details: D, store: S, config: IngestConfig) -> Self {
        Self {
            pages,
            details,
            store,
            config,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// The store this pipeline writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs ingestion for at most `max_pages` pages without progress reporting.
    pub async fn run(&self, max_pages: u32, cancel_token: &CancellationToken) -> RunSummary {
        self.run_with_progress(max_pages, cancel_token, &SilentReporter)
            .await
    }

    /// Runs ingestion for at most `max_pages` pages.
    ///
    /// Never returns an error: listing and commit failures end the run and
    /// are reported through [`RunSummary::status`] and [`RunSummary::error`].
    pub async fn run_with_progress<R: ProgressReporter>(
        &self,
        max_pages: u32,
        cancel_token: &CancellationToken,
        reporter: &R,
    ) -> RunSummary {
        let mut summary = RunSummary::new();
        reporter.report(IngestEvent::RunStarted {
            max_pages,
            concurrency: self.config.concurrency,
        });

        let mut cursor: Option<Reference> = None;

        let status = loop {
            if summary.pages_processed >= max_pages {
                break RunStatus::Completed;
            }
            if cancel_token.is_cancelled() {
                break RunStatus::Cancelled;
            }

            let page_number = summary.pages_processed + 1;

            let page = match self.pages.fetch_page(cursor.as_ref()).await {
                Ok(page) => page,
                Err(e) => {
                    let error = e.to_string();
                    reporter.report(IngestEvent::PageFailed {
                        page: page_number,
                        error: &error,
                    });
                    summary.record_failed_page(None, &error);
                    break RunStatus::Failed;
                }
            };

            reporter.report(IngestEvent::PageFetched {
                page: page_number,
                cursor: cursor.as_ref(),
                items: page.items.len(),
            });

            let (records, stats) = self.fetch_details(&page.items, reporter).await;

            let upserted = match self.commit(&records).await {
                Ok(upserted) => upserted,
                Err(e) => {
                    let error = e.to_string();
                    reporter.report(IngestEvent::PageFailed {
                        page: page_number,
                        error: &error,
                    });
                    summary.record_failed_page(Some(&stats), &error);
                    break RunStatus::Failed;
                }
            };

            summary.record_page(&stats, upserted);
            reporter.report(IngestEvent::PageCommitted {
                page: page_number,
                upserted,
                stats: &stats,
                next: page.next.as_ref(),
            });

            cursor = page.next;
            if cursor.is_none() {
                summary.upstream_exhausted = true;
                break RunStatus::Completed;
            }
        };

        let summary = summary.finish(status);
        reporter.report(IngestEvent::RunFinished { summary: &summary });
        summary
    }

    /// Fetches every reference with bounded concurrency and collects each outcome.
    ///
    /// Records sharing an id collapse to the last one seen, so a page's batch
    /// never writes the same id twice.
    async fn fetch_details<R: ProgressReporter>(
        &self,
        items: &[Reference],
        reporter: &R,
    ) -> (Vec<Record>, PageStats) {
        let results: Vec<(Reference, Result<Option<Record>, AppError>)> =
            stream::iter(items.iter().cloned())
                .map(|reference| {
                    let details = self.details.clone();
                    async move {
                        let result = details.fetch_detail(&reference).await;
                        (reference, result)
                    }
                })
                .buffer_unordered(self.config.concurrency.max(1))
                .collect()
                .await;

        let mut stats = PageStats::new();
        let mut by_id: BTreeMap<i64, Record> = BTreeMap::new();

        for (reference, result) in results {
            match result {
                Ok(Some(record)) if record.id > 0 => {
                    stats.record(ItemOutcome::Fetched);
                    by_id.insert(record.id, record);
                }
                Ok(_) => {
                    stats.record(ItemOutcome::Skipped);
                    reporter.report(IngestEvent::ItemSkipped {
                        reference: &reference,
                    });
                }
                Err(e) => {
                    stats.record(ItemOutcome::Failed);
                    let error = e.to_string();
                    reporter.report(IngestEvent::ItemFailed {
                        reference: &reference,
                        error: &error,
                    });
                }
            }
        }

        (by_id.into_values().collect(), stats)
    }

    /// Writes a page's records as one batch. Empty pages skip the store.
    ///
    /// Returns the number of distinct ids written.
    async fn commit(&self, records: &[Record]) -> Result<u64, AppError> {
        if records.is_empty() {
            return Ok(0);
        }
        self.store.upsert_batch(records).await?;
        Ok(records.len() as u64)
    }
}
