//! Test utilities and mock implementations for integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dexter_core::traits::{DetailFetcher, PageFetcher, RecordStore};
use dexter_core::{AppError, IngestEvent, Page, ProgressReporter, Record, Reference};
use tokio::sync::Semaphore;

pub fn record(id: i64, name: &str) -> Record {
    Record {
        id,
        name: name.to_string(),
        sprite_url: Some(format!("https://img.example/sprites/{}.png", id)),
        artwork_url: Some(format!("https://img.example/artwork/{}.png", id)),
        base_experience: Some(id * 10),
    }
}

pub fn detail_url(id: i64) -> String {
    format!("https://api.example/item/{}/", id)
}

// =============================================================================
// MockPageFetcher
// =============================================================================

/// Serves a fixed sequence of pages.
///
/// Page `n` (0-based) is linked to page `n + 1` through the cursor
/// `https://api.example/list?page=<n+1>`; the last page has no `next`.
#[derive(Clone)]
pub struct MockPageFetcher {
    pages: Arc<Vec<Vec<Reference>>>,
    /// Page indexes whose fetch fails.
    failing: Arc<HashSet<usize>>,
    pub requested: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockPageFetcher {
    pub fn new(pages: Vec<Vec<Reference>>) -> Self {
        Self {
            pages: Arc::new(pages),
            failing: Arc::new(HashSet::new()),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `count` pages of `per_page` items with ids numbered from 1.
    pub fn numbered(count: usize, per_page: usize) -> Self {
        let pages = (0..count)
            .map(|p| {
                (0..per_page)
                    .map(|i| Reference::new(detail_url((p * per_page + i + 1) as i64)))
                    .collect()
            })
            .collect();
        Self::new(pages)
    }

    pub fn fail_page(mut self, index: usize) -> Self {
        let mut failing = (*self.failing).clone();
        failing.insert(index);
        self.failing = Arc::new(failing);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    fn cursor_for(index: usize) -> Reference {
        Reference::new(format!("https://api.example/list?page={}", index))
    }

    fn index_of(cursor: Option<&Reference>) -> Result<usize, AppError> {
        match cursor {
            None => Ok(0),
            Some(c) => c
                .url
                .rsplit('=')
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| AppError::InvalidUrl(c.url.clone())),
        }
    }
}

impl PageFetcher for MockPageFetcher {
    async fn fetch_page(&self, cursor: Option<&Reference>) -> Result<Page, AppError> {
        self.requested
            .lock()
            .unwrap()
            .push(cursor.map(|c| c.url.clone()));

        let index = Self::index_of(cursor)?;
        if self.failing.contains(&index) {
            let message = format!("HTTP 503 from page {}", index);
            return Err(AppError::ClientError(message));
        }

        let items = self
            .pages
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::ClientError(format!("HTTP 404 from page {}", index)))?;

        let next = (index + 1 < self.pages.len()).then(|| Self::cursor_for(index + 1));
        Ok(Page { items, next })
    }
}

// =============================================================================
// MockDetailFetcher
// =============================================================================

/// How the mock answers a given detail URL.
#[derive(Clone)]
pub enum Detail {
    Found(Record),
    /// Body parsed but carried no id.
    NoId,
    Fail,
}

/// Detail fetcher answering from a URL table.
///
/// URLs not in the table resolve to a record whose id is taken from the
/// trailing path segment. Optionally gated on a semaphore and delayed,
/// and tracks the peak number of concurrent calls.
#[derive(Clone)]
pub struct MockDetailFetcher {
    table: Arc<HashMap<String, Detail>>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    in_flight: Arc<AtomicUsize>,
    pub peak_in_flight: Arc<AtomicUsize>,
    pub started: Arc<AtomicUsize>,
}

impl MockDetailFetcher {
    pub fn new() -> Self {
        Self {
            table: Arc::new(HashMap::new()),
            delay: None,
            gate: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            started: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with(mut self, url: impl Into<String>, detail: Detail) -> Self {
        let mut table = (*self.table).clone();
        table.insert(url.into(), detail);
        self.table = Arc::new(table);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call consumes a permit from `gate` before answering.
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    fn id_from_url(url: &str) -> Option<i64> {
        url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
    }
}

impl Default for MockDetailFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DetailFetcher for MockDetailFetcher {
    async fn fetch_detail(&self, reference: &Reference) -> Result<Option<Record>, AppError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            // Each permit lets exactly one call through.
            gate.acquire()
                .await
                .map_err(|e| AppError::Generic(e.to_string()))?
                .forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.table.get(&reference.url) {
            Some(Detail::Found(record)) => Ok(Some(record.clone())),
            Some(Detail::NoId) => Ok(None),
            Some(Detail::Fail) => Err(AppError::NetworkError(format!(
                "connection reset fetching {}",
                reference.url
            ))),
            None => Ok(Self::id_from_url(&reference.url)
                .map(|id| record(id, &format!("item-{}", id)))),
        }
    }
}

// =============================================================================
// MockRecordStore
// =============================================================================

/// In-memory store keeping first-insertion order.
#[derive(Clone, Default)]
pub struct MockRecordStore {
    records: Arc<Mutex<Vec<Record>>>,
    /// 1-based batch number that fails.
    fail_on_batch: Option<usize>,
    pub batches: Arc<AtomicUsize>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_batch(batch: usize) -> Self {
        Self {
            fail_on_batch: Some(batch),
            ..Self::default()
        }
    }

    pub fn seeded(records: Vec<Record>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.snapshot().iter().map(|r| r.id).collect()
    }
}

impl RecordStore for MockRecordStore {
    async fn upsert_batch(&self, batch: &[Record]) -> Result<u64, AppError> {
        let n = self.batches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_batch == Some(n) {
            return Err(AppError::Generic("disk I/O error".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        for incoming in batch {
            match records.iter_mut().find(|r| r.id == incoming.id) {
                Some(existing) => *existing = incoming.clone(),
                None => records.push(incoming.clone()),
            }
        }
        Ok(batch.len() as u64)
    }

    async fn list_all(&self) -> Result<Vec<Record>, AppError> {
        Ok(self.snapshot())
    }

    async fn clear(&self) -> Result<u64, AppError> {
        let mut records = self.records.lock().unwrap();
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }

    async fn count(&self) -> Result<u64, AppError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }
}

// =============================================================================
// RecordingReporter
// =============================================================================

/// Reporter that keeps a compact trace of the events it saw.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: IngestEvent<'_>) {
        let line = match event {
            IngestEvent::RunStarted { max_pages, .. } => format!("start:{}", max_pages),
            IngestEvent::PageFetched { page, items, .. } => format!("fetched:{}:{}", page, items),
            IngestEvent::ItemFailed { .. } => "item_failed".to_string(),
            IngestEvent::ItemSkipped { .. } => "item_skipped".to_string(),
            IngestEvent::PageCommitted { page, upserted, .. } => {
                format!("committed:{}:{}", page, upserted)
            }
            IngestEvent::PageFailed { page, .. } => format!("page_failed:{}", page),
            IngestEvent::RunFinished { summary } => format!("finished:{}", summary.status),
        };
        self.events.lock().unwrap().push(line);
    }
}
