//! Domain models shared by the fetchers, the store, and the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::summary::RunSummary;

/// Opaque pointer to an upstream resource (a detail document or a listing page).
///
/// Carries no identity beyond its URL string; fetchers request it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub url: String,
}

impl Reference {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&str> for Reference {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Reference {
    fn from(url: String) -> Self {
        Self { url }
    }
}

/// One page of the upstream listing.
///
/// `next == None` signals the end of the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Reference>,
    pub next: Option<Reference>,
}

/// Normalized, persisted entity.
///
/// `id` is unique in the store and always positive; re-ingesting an existing
/// `id` overwrites the row in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Record {
    pub id: i64,
    pub name: String,
    /// Small front-facing sprite (`sprites.front_default`).
    pub sprite_url: Option<String>,
    /// Official artwork (`sprites.other["official-artwork"].front_default`).
    pub artwork_url: Option<String>,
    pub base_experience: Option<i64>,
}

/// Transient, process-wide view of the ingestion lifecycle.
///
/// Owned by the controller. Updated after each committed page and reset to
/// its initial value when a run ends; `last_run` survives the reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionState {
    /// Cursor of the next page to fetch, `None` before the first page.
    pub cursor: Option<Reference>,
    pub pages_processed: u32,
    pub running: bool,
    pub cancelled: bool,
    pub started_at: Option<DateTime<Utc>>,
    /// Summary of the most recently finished run.
    pub last_run: Option<RunSummary>,
}

impl IngestionState {
    /// Returns the state with every run field cleared, keeping `last_run`.
    pub fn reset(&mut self) {
        let last_run = self.last_run.take();
        *self = Self {
            last_run,
            ..Self::default()
        };
    }
}
