//! Run accounting.
//!
//! Pure bookkeeping for one ingestion run, decoupled from I/O: per-item
//! outcomes roll up into [`PageStats`], committed pages roll up into
//! [`RunSummary`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a single detail fetch within a page's fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Detail fetched and normalized into a record.
    Fetched,
    /// Body had no usable id; dropped without error.
    Skipped,
    /// Transport or parse failure for this item only.
    Failed,
}

/// Item counters for one page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageStats {
    pub fetched: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl PageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Fetched => self.fetched += 1,
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Failed => self.failed += 1,
        }
    }

    /// Returns the number of references the page carried.
    pub fn total(&self) -> u64 {
        self.fetched + self.skipped + self.failed
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Page limit reached or upstream exhausted.
    #[default]
    Completed,
    /// Stop requested; observed at a page boundary.
    Cancelled,
    /// A listing fetch or a page commit failed.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub pages_processed: u32,
    /// Distinct ids written across all committed pages.
    pub records_upserted: u64,
    pub pages_failed: u32,
    pub items_failed: u64,
    pub items_skipped: u64,
    pub status: RunStatus,
    /// True when the upstream returned no `next` cursor.
    pub upstream_exhausted: bool,
    /// Message of the error that ended a failed run.
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pages_processed: 0,
            records_upserted: 0,
            pages_failed: 0,
            items_failed: 0,
            items_skipped: 0,
            status: RunStatus::Completed,
            upstream_exhausted: false,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a committed page into the totals.
    pub fn record_page(&mut self, stats: &PageStats, upserted: u64) {
        self.pages_processed += 1;
        self.records_upserted += upserted;
        self.items_failed += stats.failed;
        self.items_skipped += stats.skipped;
    }

    /// Folds a page whose commit was aborted. Item counters still count.
    pub fn record_failed_page(&mut self, stats: Option<&PageStats>, error: &str) {
        self.pages_failed += 1;
        if let Some(stats) = stats {
            self.items_failed += stats.failed;
            self.items_skipped += stats.skipped;
        }
        self.status = RunStatus::Failed;
        self.error = Some(error.to_string());
    }

    pub fn finish(mut self, status: RunStatus) -> Self {
        if self.status != RunStatus::Failed {
            self.status = status;
        }
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }
}
