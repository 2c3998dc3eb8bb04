//! Dexter Server - REST API over the ingestion controller
//!
//! A UI layer drives ingestion through these endpoints:
//!
//! - **Records**: list stored records, or clear the store
//! - **Ingest**: start and stop a run, poll its status
//! - **Health**: liveness plus store reachability

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use router::create_router;
pub use state::{AppState, Controller};
