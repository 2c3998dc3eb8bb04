//! Trait definitions for external dependencies.
//!
//! The pipeline never talks to HTTP or SQL directly. It is generic over
//! these three traits, so production wires in the reqwest client and the
//! SQLite repository while tests wire in in-memory mocks.
//!
//! # Example
//!
//! ```
//! use dexter_core::traits::{DetailFetcher, PageFetcher};
//! use dexter_core::{AppError, Record};
//!
//! async fn first_page_records<P, D>(pages: &P, details: &D) -> Result<Vec<Record>, AppError>
//! where
//!     P: PageFetcher,
//!     D: DetailFetcher,
//! {
//!     let page = pages.fetch_page(None).await?;
//!     let mut records = Vec::new();
//!     for item in &page.items {
//!         if let Some(record) = details.fetch_detail(item).await? {
//!             records.push(record);
//!         }
//!     }
//!     Ok(records)
//! }
//! ```

use std::future::Future;

use crate::{AppError, Page, Record, Reference};

/// Fetches one page of the upstream listing.
pub trait PageFetcher: Send + Sync + Clone {
    /// Fetches the page at `cursor`, or the well-known first page when `None`.
    ///
    /// `cursor.url` is requested verbatim. Transport failures, non-2xx
    /// statuses and malformed bodies are returned as network-class errors
    /// and are not retried.
    fn fetch_page(
        &self,
        cursor: Option<&Reference>,
    ) -> impl Future<Output = Result<Page, AppError>> + Send;
}

/// Fetches and normalizes a single item.
pub trait DetailFetcher: Send + Sync + Clone {
    /// Fetches `reference` and maps it into a [`Record`].
    ///
    /// Returns `Ok(None)` when the body has no usable id. That is a
    /// data-quality skip, not an error.
    fn fetch_detail(
        &self,
        reference: &Reference,
    ) -> impl Future<Output = Result<Option<Record>, AppError>> + Send;
}

/// Local table of records keyed by id.
pub trait RecordStore: Send + Sync + Clone {
    /// Inserts or replaces each record by id.
    ///
    /// Atomic per call: either the whole batch applies or prior state is
    /// left unchanged. Returns the number of rows written.
    fn upsert_batch(&self, records: &[Record])
    -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Returns every stored record.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Record>, AppError>> + Send;

    /// Removes all records. Clearing an empty store succeeds.
    ///
    /// Returns the number of rows removed.
    fn clear(&self) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Returns the number of stored records.
    fn count(&self) -> impl Future<Output = Result<u64, AppError>> + Send;
}
