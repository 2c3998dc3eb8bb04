use clap::{Parser, Subcommand, ValueEnum};
use dexter_core::{DEFAULT_CONCURRENCY, DEFAULT_MAX_PAGES, DEFAULT_START_URL};

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "dexter")]
#[command(
    author,
    version,
    about = "Paginated catalog ingestion into a local SQLite store"
)]
#[command(after_help = "Examples:
  dexter ingest
  dexter ingest --max-pages 5 --concurrency 4
  dexter list --format csv --limit 20
  dexter stats
  dexter reset")]
pub struct Config {
    /// SQLite database URL (created if missing)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://dexter.db")]
    pub database_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "DEXTER_HTTP_TIMEOUT", default_value_t = 30)]
    pub http_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk the upstream listing and store every record
    #[command(after_help = "Examples:
  dexter ingest                                  # Up to 60 pages from PokeAPI
  dexter ingest --max-pages 1                    # Just the first page
  dexter ingest --start-url http://localhost:8000/api/v2/pokemon

Press Ctrl+C to stop after the current page; committed pages are kept.")]
    Ingest {
        /// Upper bound on listing pages fetched in this run
        #[arg(long, env = "DEXTER_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
        max_pages: u32,

        /// Maximum concurrent detail requests per page
        #[arg(short, long, env = "DEXTER_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// URL of the first listing page
        #[arg(long, env = "DEXTER_START_URL", default_value = DEFAULT_START_URL)]
        start_url: String,
    },
    /// Print stored records
    #[command(after_help = "Examples:
  dexter list --format jsonl > records.jsonl
  dexter list --format csv --limit 10")]
    List {
        /// Output format
        #[arg(short, long, default_value = "jsonl")]
        format: ExportFormat,
        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Delete every stored record
    Reset,
    /// Show store statistics
    Stats,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// JSON Lines format (one JSON object per line)
    Jsonl,
    /// Standard JSON array format
    Json,
    /// CSV format (comma-separated values)
    Csv,
}

impl From<ExportFormat> for dexter_core::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Jsonl => Self::Jsonl,
            ExportFormat::Json => Self::Json,
            ExportFormat::Csv => Self::Csv,
        }
    }
}
