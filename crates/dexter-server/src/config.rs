use clap::Parser;
use dexter_core::{DEFAULT_CONCURRENCY, DEFAULT_MAX_PAGES, DEFAULT_START_URL};

/// Server configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "dexter-server")]
#[command(author, version, about = "REST API server for Dexter ingestion")]
pub struct ServerConfig {
    /// SQLite database URL (created if missing)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://dexter.db")]
    pub database_url: String,

    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// URL of the first listing page
    #[arg(long, env = "DEXTER_START_URL", default_value = DEFAULT_START_URL)]
    pub start_url: String,

    /// Page limit for runs that do not pick their own
    #[arg(long, env = "DEXTER_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: u32,

    /// Maximum concurrent detail requests per page
    #[arg(short, long, env = "DEXTER_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// HTTP request timeout in seconds
    #[arg(long, env = "DEXTER_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,

    /// Allowed CORS origins, comma-separated, or "*" for any
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,
}
