use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use dexter_cli::{Command, Config, ExportFormat};
use dexter_client::PokeApiClient;
use dexter_core::{
    DbConfig, ExportService, HttpConfig, IngestConfig, IngestionController, IngestionPipeline,
    RunSummary, TracingReporter,
};
use dexter_db::RecordRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = Config::parse();

    info!("Opening database...");
    let repo = RecordRepository::connect(&config.database_url, &DbConfig::default())
        .await
        .context("Failed to open database")?;
    repo.migrate().await.context("Failed to apply schema")?;

    match config.command {
        Command::Ingest {
            max_pages,
            concurrency,
            start_url,
        } => {
            let ingest_config = IngestConfig::default()
                .with_start_url(start_url)
                .with_max_pages(max_pages)
                .with_concurrency(concurrency);
            let http_config =
                HttpConfig::default().with_timeout(Duration::from_secs(config.http_timeout));
            ingest(repo, ingest_config, &http_config).await?;
        }
        Command::List { format, limit } => {
            list(repo, format, limit).await?;
        }
        Command::Reset => {
            let removed = repo.clear().await?;
            info!("Removed {} records", removed);
        }
        Command::Stats => {
            show_stats(&repo).await?;
        }
    }

    Ok(())
}

async fn ingest(
    repo: RecordRepository,
    ingest_config: IngestConfig,
    http_config: &HttpConfig,
) -> anyhow::Result<()> {
    ingest_config.validate().map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let client = PokeApiClient::with_config(&ingest_config.start_url, http_config)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!("Ingesting from: {}", ingest_config.start_url);
    let max_pages = ingest_config.max_pages;
    let pipeline = IngestionPipeline::with_config(client.clone(), client, repo, ingest_config);
    let controller = IngestionController::with_reporter(pipeline, TracingReporter);

    controller.start(max_pages).await;

    let summary = tokio::select! {
        summary = controller.wait() => summary,
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl+C received, stopping after the current page...");
            controller.stop();
            controller.wait().await
        }
    };

    let summary = summary.context("Ingestion task did not report a summary")?;
    print_run_summary(&summary, max_pages);

    if summary.is_failed() {
        anyhow::bail!(
            "Ingestion failed: {}",
            summary.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_run_summary(summary: &RunSummary, max_pages: u32) {
    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("Ingestion {}: run {}", summary.status, summary.run_id);
    info!("═══════════════════════════════════════════════════════");
    info!("  Pages processed:     {}", summary.pages_processed);
    info!("  Records upserted:    {}", summary.records_upserted);
    info!("  Items skipped:       {}", summary.items_skipped);
    info!("  Items failed:        {}", summary.items_failed);
    info!("  Pages failed:        {}", summary.pages_failed);
    if let Some(note) = exhaustion_note(summary, max_pages) {
        info!("  {}", note);
    }
    info!("═══════════════════════════════════════════════════════");
}

fn exhaustion_note(summary: &RunSummary, max_pages: u32) -> Option<&'static str> {
    if !summary.upstream_exhausted {
        None
    } else if summary.pages_processed < max_pages {
        Some("Upstream exhausted before the page limit")
    } else {
        Some("Upstream exhausted")
    }
}

async fn list(
    repo: RecordRepository,
    format: ExportFormat,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let export_service = ExportService::new(repo);

    let stdout = io::stdout();
    let mut writer = stdout.lock();

    let count = export_service
        .export_to_writer(&mut writer, format.into(), limit)
        .await?;

    if count == 0 {
        eprintln!("No records stored. Run `dexter ingest` first.");
    } else {
        info!("Listed {} records", count);
    }

    Ok(())
}

async fn show_stats(repo: &RecordRepository) -> anyhow::Result<()> {
    let count = repo.count().await?;

    println!("\nStore Statistics\n");
    println!("  Total records:         {}", count);
    println!();

    Ok(())
}
