//! Configuration types for Dexter components.
//!
//! Binaries fill these from clap flags (with environment fallbacks);
//! library code only ever sees the typed structs.

use std::time::Duration;

use crate::error::AppError;

/// First page of the upstream listing.
pub const DEFAULT_START_URL: &str = "https://pokeapi.co/api/v2/pokemon";

/// Default page limit per run.
pub const DEFAULT_MAX_PAGES: u32 = 60;

/// Default number of detail fetches in flight per page.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub max_connections: u32,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self { max_connections: 5 }
    }
}

/// HTTP client configuration for upstream API calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("dexter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Ingestion run configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Address of the first listing page.
    pub start_url: String,
    /// Upper bound on pages fetched per run.
    ///
    /// Caps both the number of ingested items and the number of outbound
    /// listing requests. The run stops earlier if the upstream runs out.
    pub max_pages: u32,
    /// Maximum concurrent detail fetches within one page.
    pub concurrency: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl IngestConfig {
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        self.start_url = url.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Sets the fan-out width. Values below 1 are raised to 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Checks the values a caller may have supplied from the environment.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.start_url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "start URL must not be empty".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AppError::ConfigError(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
