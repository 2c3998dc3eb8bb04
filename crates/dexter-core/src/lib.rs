//! Dexter Core - Domain types, ingestion pipeline, and run control.
//!
//! This crate provides the reusable part of Dexter:
//!
//! - **Domain models**: [`Reference`], [`Page`], [`Record`], [`IngestionState`]
//! - **Services**: [`IngestionPipeline`] walks the paged upstream and commits
//!   records page by page; [`IngestionController`] owns the run lifecycle;
//!   [`ExportService`] writes stored records out
//! - **Traits**: [`PageFetcher`], [`DetailFetcher`], [`RecordStore`] for dependency injection
//! - **Progress reporting**: [`ProgressReporter`] trait for decoupled logging/UI
//!
//! # Architecture
//!
//! Business logic is decoupled from I/O through the traits above. The
//! `dexter-client` crate implements both fetchers over HTTP, `dexter-db`
//! implements the store over SQLite, and the CLI/server frontends wire
//! them together.
//!
//! # Example
//!
//! ```ignore
//! use dexter_core::{IngestConfig, IngestionController, IngestionPipeline, TracingReporter};
//!
//! let pipeline = IngestionPipeline::with_config(client.clone(), client, repo, IngestConfig::default());
//! let controller = IngestionController::with_reporter(pipeline, TracingReporter);
//! controller.start(60).await;
//! let summary = controller.wait().await;
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod summary;
pub mod traits;

// Configuration
pub use config::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_PAGES, DEFAULT_START_URL, DbConfig, HttpConfig, IngestConfig,
};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{IngestionState, Page, Record, Reference};

// Run accounting
pub use summary::{ItemOutcome, PageStats, RunStatus, RunSummary};

// Progress reporting
pub use progress::{IngestEvent, ProgressReporter, SilentReporter, TracingReporter};

// Traits for dependency injection
pub use traits::{DetailFetcher, PageFetcher, RecordStore};

// Services (generic over trait implementations)
pub use controller::IngestionController;
pub use export::{ExportFormat, ExportService};
pub use pipeline::IngestionPipeline;
