//! Export, reconciliation and ingest services
//!
//! Everything here is built from the two ports in `core::traits`, so the same
//! services run against Postgres and Elasticsearch in production and against
//! in-memory fakes in tests.

pub mod admin;
pub mod bulk_writer;
pub mod exporter;
pub mod gap_filler;
pub mod ingest;
pub mod worker_pool;

pub use admin::{collect_stats, create_indexes, delete_indexes, IndexCount, StatsReport};
pub use bulk_writer::{BulkWriter, WriteOutcome};
pub use exporter::{range_batches, serialize_rows, BatchReport, ExportReport, Exporter, Selection, Serialized};
pub use gap_filler::{GapFillOptions, GapFillState, GapFiller, GapReport};
pub use ingest::{IngestStep, LiveIngester, StreamIngester, StreamReport};
pub use worker_pool::WorkerPool;
