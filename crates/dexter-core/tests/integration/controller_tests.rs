//! Integration tests for IngestionController lifecycle rules.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dexter_core::{
    AppError, IngestConfig, IngestEvent, IngestionController, IngestionPipeline, ProgressReporter,
    RunStatus,
};
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};

use super::common::{MockDetailFetcher, MockPageFetcher, MockRecordStore, record};

type Controller = IngestionController<MockPageFetcher, MockDetailFetcher, MockRecordStore>;

fn controller(
    pages: MockPageFetcher,
    details: MockDetailFetcher,
    store: MockRecordStore,
) -> Controller {
    let pipeline = IngestionPipeline::with_config(
        pages,
        details,
        store,
        IngestConfig::default().with_max_pages(7).with_concurrency(2),
    );
    IngestionController::new(pipeline)
}

/// Waits until at least one detail fetch has begun.
async fn until_fan_out_started(details: &MockDetailFetcher) {
    timeout(Duration::from_secs(5), async {
        while details.started.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("fan-out never started");
}

#[tokio::test]
async fn test_start_runs_to_completion() {
    let store = MockRecordStore::new();
    let controller = controller(
        MockPageFetcher::numbered(3, 2),
        MockDetailFetcher::new(),
        store.clone(),
    );

    assert!(controller.start(10).await);
    let summary = controller.wait().await.expect("summary");

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.pages_processed, 3);
    assert_eq!(store.ids().len(), 6);

    let state = controller.status();
    assert!(!state.running);
    assert!(!state.cancelled);
    assert_eq!(state.pages_processed, 0);
    assert!(state.cursor.is_none());
    assert_eq!(state.last_run, Some(summary));
}

#[tokio::test]
async fn test_start_while_running_is_noop() {
    let gate = Arc::new(Semaphore::new(0));
    let pages = MockPageFetcher::numbered(2, 1);
    let details = MockDetailFetcher::new().with_gate(Arc::clone(&gate));
    let controller = controller(pages.clone(), details.clone(), MockRecordStore::new());

    assert!(controller.start(5).await);
    until_fan_out_started(&details).await;

    assert!(!controller.start(5).await, "second start must be ignored");
    assert!(controller.status().running);

    gate.add_permits(100);
    let summary = controller.wait().await.expect("summary");

    assert_eq!(summary.pages_processed, 2);
    assert_eq!(pages.request_count(), 2, "only one run fetched pages");
}

#[tokio::test]
async fn test_stop_mid_page_finishes_that_page_only() {
    // Arrange: page one's fan-out is held until we have requested a stop
    let gate = Arc::new(Semaphore::new(0));
    let pages = MockPageFetcher::numbered(4, 3);
    let details = MockDetailFetcher::new().with_gate(Arc::clone(&gate));
    let store = MockRecordStore::new();
    let controller = controller(pages.clone(), details.clone(), store.clone());

    // Act
    assert!(controller.start(4).await);
    until_fan_out_started(&details).await;
    assert!(controller.stop());
    assert!(controller.status().cancelled);
    gate.add_permits(100);
    let summary = controller.wait().await.expect("summary");

    // Assert: page one committed in full, page two never requested
    assert_eq!(summary.status, RunStatus::Cancelled);
    assert_eq!(summary.pages_processed, 1);
    assert_eq!(store.ids(), vec![1, 2, 3]);
    assert_eq!(pages.request_count(), 1);
    assert!(!controller.status().running);
}

#[tokio::test]
async fn test_stop_when_idle_returns_false() {
    let controller = controller(
        MockPageFetcher::numbered(1, 1),
        MockDetailFetcher::new(),
        MockRecordStore::new(),
    );
    assert!(!controller.stop());
    assert!(!controller.status().cancelled);
}

#[tokio::test]
async fn test_reset_while_running_fails_and_leaves_store() {
    let gate = Arc::new(Semaphore::new(0));
    let details = MockDetailFetcher::new().with_gate(Arc::clone(&gate));
    let store = MockRecordStore::seeded(vec![record(500, "existing")]);
    let controller = controller(
        MockPageFetcher::numbered(1, 2),
        details.clone(),
        store.clone(),
    );

    controller.start(1).await;
    until_fan_out_started(&details).await;

    let result = controller.reset().await;

    assert!(matches!(result, Err(AppError::InvalidState(_))));
    assert_eq!(store.ids(), vec![500]);

    gate.add_permits(100);
    controller.wait().await;
}

#[tokio::test]
async fn test_reset_when_idle_clears_store() {
    let store = MockRecordStore::new();
    let controller = controller(
        MockPageFetcher::numbered(2, 2),
        MockDetailFetcher::new(),
        store.clone(),
    );
    controller.start(2).await;
    controller.wait().await;
    assert_eq!(store.ids().len(), 4);

    let removed = controller.reset().await.unwrap();

    assert_eq!(removed, 4);
    assert!(store.ids().is_empty());
    // Idempotent on an empty store
    assert_eq!(controller.reset().await.unwrap(), 0);
}

#[tokio::test]
async fn test_status_tracks_committed_pages() {
    let gate = Arc::new(Semaphore::new(0));
    let details = MockDetailFetcher::new().with_gate(Arc::clone(&gate));
    let controller = controller(
        MockPageFetcher::numbered(3, 1),
        details.clone(),
        MockRecordStore::new(),
    );

    controller.start(3).await;
    until_fan_out_started(&details).await;
    assert_eq!(controller.status().pages_processed, 0);
    assert!(controller.status().started_at.is_some());

    // Release exactly page one's single detail fetch
    gate.add_permits(1);
    timeout(Duration::from_secs(5), async {
        while controller.status().pages_processed < 1 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("page one never committed");

    let state = controller.status();
    assert!(state.running);
    assert_eq!(
        state.cursor.map(|c| c.url),
        Some("https://api.example/list?page=1".to_string())
    );

    gate.add_permits(100);
    let summary = controller.wait().await.expect("summary");
    assert_eq!(summary.pages_processed, 3);
}

#[tokio::test]
async fn test_restart_after_completion_starts_from_first_page() {
    let pages = MockPageFetcher::numbered(2, 1);
    let controller = controller(
        pages.clone(),
        MockDetailFetcher::new(),
        MockRecordStore::new(),
    );

    controller.start(1).await;
    controller.wait().await;
    controller.start(1).await;
    controller.wait().await;

    let requested = pages.requested.lock().unwrap().clone();
    assert_eq!(requested, vec![None, None]);
}

#[tokio::test]
async fn test_wait_without_run_returns_none() {
    let controller = controller(
        MockPageFetcher::numbered(1, 1),
        MockDetailFetcher::new(),
        MockRecordStore::new(),
    );
    assert!(controller.wait().await.is_none());
    assert_eq!(controller.default_max_pages(), 7);
}

/// Panics on the first committed page it sees, then behaves.
#[derive(Default)]
struct PanicOnFirstCommit {
    fired: AtomicBool,
}

impl ProgressReporter for PanicOnFirstCommit {
    fn report(&self, event: IngestEvent<'_>) {
        if matches!(event, IngestEvent::PageCommitted { .. })
            && !self.fired.swap(true, Ordering::SeqCst)
        {
            panic!("reporter failure");
        }
    }
}

#[tokio::test]
async fn test_panicked_run_releases_running_flag() {
    let store = MockRecordStore::new();
    let pipeline = IngestionPipeline::with_config(
        MockPageFetcher::numbered(2, 1),
        MockDetailFetcher::new(),
        store.clone(),
        IngestConfig::default().with_max_pages(7),
    );
    let controller = IngestionController::with_reporter(pipeline, PanicOnFirstCommit::default());

    assert!(controller.start(5).await);

    // No wait(): the state must clear on its own once the task dies
    timeout(Duration::from_secs(5), async {
        while controller.is_running() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("running flag never cleared");

    assert!(controller.status().last_run.is_none());
    assert_eq!(controller.reset().await.unwrap(), 1);

    assert!(controller.start(5).await);
    let summary = controller.wait().await.expect("summary");
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.pages_processed, 2);
}
