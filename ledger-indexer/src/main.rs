//! Ledger Search Indexer
//!
//! Exports closed ledgers from the validator's history database into search
//! indexes, tails new ledgers, and repairs gaps in what has been indexed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_indexer::api::{self, Metrics};
use ledger_indexer::config::IndexerConfig;
use ledger_indexer::core::{DocumentIndex, LedgerSource};
use ledger_indexer::database::{ElasticIndex, PostgresSource};
use ledger_indexer::services::{
    collect_stats, create_indexes, delete_indexes, BulkWriter, Exporter, GapFillOptions, GapFiller, LiveIngester,
    StreamIngester, WorkerPool,
};
use ledger_indexer::stream::LedgerCloseDecoder;

#[derive(Parser)]
#[command(name = "ledger-indexer")]
#[command(about = "Ledger history search indexer")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "indexer.toml")]
    config: String,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tail the source database and index each new ledger
    Ingest {
        /// Start after this ledger instead of the highest indexed one
        #[arg(long)]
        after: Option<u32>,
    },
    /// Index ledger close frames from a file or named pipe ("-" for stdin)
    IngestStream { input: String },
    /// Export `count` ledgers starting at `start`
    Export {
        #[arg(long)]
        start: u32,
        #[arg(long)]
        count: u32,
    },
    /// Find ledgers missing from the index and re-export them
    FillGaps {
        #[arg(long)]
        start: Option<u32>,
        #[arg(long)]
        count: Option<u32>,
        /// Only report what is missing
        #[arg(long)]
        dry_run: bool,
    },
    /// Print index and source database status
    Stats {
        /// Ledger sequences per bucket in the ledger count histogram
        #[arg(long, default_value_t = 100_000)]
        bucket: u32,
    },
    /// Create every index with its mapping
    CreateIndexes,
    /// Delete every index
    DeleteIndexes,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_missing = !std::path::Path::new(&cli.config).exists();
    let mut config = if config_missing {
        IndexerConfig::from_env()?
    } else {
        IndexerConfig::from_file(&cli.config)?
    };

    // Override log level if provided
    if let Some(log_level) = cli.log_level {
        config.monitoring.log_level = log_level;
    }

    // Initialize logging
    init_logging(&config)?;
    if config_missing {
        warn!("Config file not found, using defaults: {}", cli.config);
    }

    info!("Starting ledger indexer");
    info!("Source database: {}", redact(&config.database.url));
    info!("Document index: {}", config.elastic.url);

    let metrics = Arc::new(Metrics::new()?);
    let _metrics_server = if config.monitoring.metrics_port > 0 {
        info!("Starting metrics server on port {}", config.monitoring.metrics_port);
        Some(api::start_metrics_server(config.monitoring.metrics_port, metrics.clone()).await?)
    } else {
        None
    };

    let elastic = Arc::new(ElasticIndex::new(&config.elastic)?);
    let index: Arc<dyn DocumentIndex> = elastic.clone();

    match cli.command {
        Command::CreateIndexes => create_indexes(index.as_ref()).await?,
        Command::DeleteIndexes => delete_indexes(index.as_ref()).await?,
        Command::IngestStream { input } => {
            let writer = bulk_writer(&config, index, metrics.clone());
            let decoder = LedgerCloseDecoder::new(&config.indexer.network_passphrase);
            let ingester = StreamIngester::new(decoder, writer, elastic.prefix(), metrics);
            let report = if input == "-" {
                ingester.run(tokio::io::stdin()).await?
            } else {
                let file = tokio::fs::File::open(&input)
                    .await
                    .with_context(|| format!("opening ledger stream {}", input))?;
                ingester.run(file).await?
            };
            if !report.skipped.is_empty() {
                warn!("Ledgers not written, run fill-gaps to repair: {:?}", report.skipped);
            }
        }
        command => {
            info!("Initializing database connections...");
            let source: Arc<dyn LedgerSource> = Arc::new(PostgresSource::connect(&config.database).await?);
            info!("Database connections initialized successfully");

            let writer = bulk_writer(&config, index.clone(), metrics.clone());
            let exporter = Exporter::new(source.clone(), writer, elastic.prefix(), metrics.clone());
            let pool = WorkerPool::new(config.indexer.workers);

            run_command(command, &config, index, source, exporter, pool, metrics).await?;
        }
    }

    info!("Shutting down ledger indexer");
    Ok(())
}

async fn run_command(
    command: Command,
    config: &IndexerConfig,
    index: Arc<dyn DocumentIndex>,
    source: Arc<dyn LedgerSource>,
    exporter: Exporter,
    pool: WorkerPool,
    metrics: Arc<Metrics>,
) -> Result<()> {
    match command {
        Command::Ingest { after } => {
            let ingester = LiveIngester::new(
                index,
                exporter,
                Duration::from_millis(config.indexer.poll_interval_ms),
            );
            info!("Live ingest started. Press Ctrl+C to shutdown.");
            let last = ingester
                .run(after, async {
                    if let Err(e) = signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                    info!("Received shutdown signal");
                })
                .await?;
            info!("Last ingested ledger {}", last);
        }
        Command::Export { start, count } => {
            let report = exporter
                .export_range(&pool, start, count, config.indexer.export_batch)
                .await?;
            for selection in &report.skipped {
                warn!("Batch not written: {:?}", selection);
            }
        }
        Command::FillGaps { start, count, dry_run } => {
            let options = GapFillOptions {
                scan_window: config.indexer.scan_window,
                backfill_batch: config.indexer.backfill_batch,
                dry_run,
            };
            let report = GapFiller::new(index, exporter, pool, options, metrics)
                .run(start, count)
                .await?;
            if dry_run {
                println!("{}", serde_json::to_string_pretty(&report.missing)?);
            } else if !report.missing_in_source.is_empty() {
                warn!("Missing from the source database: {:?}", report.missing_in_source);
            }
        }
        Command::Stats { bucket } => {
            let stats = collect_stats(&index, &source, bucket).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            if stats.index_shortfall() > 0 {
                warn!("Index is missing {} ledgers in its range", stats.index_shortfall());
            }
        }
        Command::IngestStream { .. } | Command::CreateIndexes | Command::DeleteIndexes => {}
    }
    Ok(())
}

fn bulk_writer(config: &IndexerConfig, index: Arc<dyn DocumentIndex>, metrics: Arc<Metrics>) -> BulkWriter {
    BulkWriter::new(
        index,
        config.indexer.bulk_retries,
        Duration::from_millis(config.indexer.retry_backoff_ms),
        metrics,
    )
}

/// Database url without its password
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => format!("{}://***@{}", &url[..scheme], &url[at + 1..]),
        _ => url.to_string(),
    }
}

fn init_logging(config: &IndexerConfig) -> Result<()> {
    let log_level = config.monitoring.log_level.parse().unwrap_or(tracing::Level::INFO);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ledger_indexer={},sqlx=warn", log_level).into());

    if config.monitoring.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    Ok(())
}
