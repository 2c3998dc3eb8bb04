//! Dexter DB - SQLite persistence for ingested records.
//!
//! The main component is [`RecordRepository`], the [`dexter_core::RecordStore`]
//! implementation backed by a single `records` table.

mod repository;

pub use repository::RecordRepository;
