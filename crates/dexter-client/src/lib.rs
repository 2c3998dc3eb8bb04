//! Dexter Client - HTTP client for the upstream catalog.
//!
//! - [`pokeapi`] - paged creatures API (listing pages and detail documents)
//!
//! The client implements both [`dexter_core::PageFetcher`] and
//! [`dexter_core::DetailFetcher`], so one instance (cloned) serves both
//! roles in the ingestion pipeline.

pub mod pokeapi;

pub use pokeapi::PokeApiClient;
