//! Export of stored records.
//!
//! [`ExportService`] reads the store through [`RecordStore::list_all`] and
//! writes the records as JSON Lines, a JSON array, or CSV.
//!
//! # Example
//!
//! ```ignore
//! use dexter_core::export::{ExportFormat, ExportService};
//! use std::io::stdout;
//!
//! let export = ExportService::new(repo);
//! let mut out = stdout().lock();
//! let count = export.export_to_writer(&mut out, ExportFormat::Csv, Some(20)).await?;
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::Record;
use crate::traits::RecordStore;

const CSV_HEADER: &str = "id,name,sprite_url,artwork_url,base_experience";

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// One JSON object per line.
    #[default]
    Jsonl,
    /// A single pretty-printed JSON array.
    Json,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jsonl => write!(f, "jsonl"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(Self::Jsonl),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(AppError::ConfigError(format!(
                "Unknown export format: '{}'. Valid options: jsonl, json, csv",
                s
            ))),
        }
    }
}

/// Writes stored records to any [`Write`] sink.
#[derive(Clone)]
pub struct ExportService<S>
where
    S: RecordStore,
{
    store: S,
}

impl<S> ExportService<S>
where
    S: RecordStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Exports up to `limit` records (all when `None`).
    ///
    /// Returns the number of records written.
    pub async fn export_to_writer<W: Write>(
        &self,
        writer: &mut W,
        format: ExportFormat,
        limit: Option<usize>,
    ) -> Result<u64, AppError> {
        let mut records = self.store.list_all().await?;
        if let Some(limit) = limit {
            records.truncate(limit);
        }

        write_records(writer, format, &records)?;
        Ok(records.len() as u64)
    }
}

fn io_err(e: std::io::Error) -> AppError {
    AppError::Generic(e.to_string())
}

fn write_records<W: Write>(
    writer: &mut W,
    format: ExportFormat,
    records: &[Record],
) -> Result<(), AppError> {
    match format {
        ExportFormat::Jsonl => {
            for record in records {
                let json = serde_json::to_string(record)?;
                writeln!(writer, "{}", json).map_err(io_err)?;
            }
        }
        ExportFormat::Json => {
            writeln!(writer, "[").map_err(io_err)?;
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    writeln!(writer, ",").map_err(io_err)?;
                }
                let json = serde_json::to_string_pretty(record)?;
                for line in json.lines() {
                    writeln!(writer, "  {}", line).map_err(io_err)?;
                }
            }
            writeln!(writer, "]").map_err(io_err)?;
        }
        ExportFormat::Csv => {
            writeln!(writer, "{}", CSV_HEADER).map_err(io_err)?;
            for record in records {
                writer
                    .write_all(format_csv_row(record).as_bytes())
                    .map_err(io_err)?;
            }
        }
    }

    writer.flush().map_err(io_err)
}

fn format_csv_row(record: &Record) -> String {
    let optional = |value: &Option<String>| value.as_deref().map(escape_csv).unwrap_or_default();
    format!(
        "{},{},{},{},{}\n",
        record.id,
        escape_csv(&record.name),
        optional(&record.sprite_url),
        optional(&record.artwork_url),
        record
            .base_experience
            .map(|xp| xp.to_string())
            .unwrap_or_default(),
    )
}

fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
