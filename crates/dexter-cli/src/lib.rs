//! Dexter CLI - argument parsing for the `dexter` binary.

pub mod config;

pub use config::{Command, Config, ExportFormat};
