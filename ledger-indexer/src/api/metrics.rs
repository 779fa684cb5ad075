//! Prometheus metrics for export, backfill and live ingest

use prometheus::{IntCounter, Opts, Registry, TextEncoder};

use crate::core::error::{IndexerError, IndexerResult};

/// Counters shared by every component that writes documents.
///
/// Each instance owns its registry so tests can build one without
/// colliding with process-wide metric names.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub ledgers_serialized: IntCounter,
    pub documents_written: IntCounter,
    pub bulk_requests: IntCounter,
    pub bulk_retries: IntCounter,
    pub bulk_failures: IntCounter,
    pub missing_ledgers: IntCounter,
    pub unindexable_ledgers: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IndexerResult<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help).namespace("ledger_indexer")).map_err(metrics_error)?;
    registry.register(Box::new(counter.clone())).map_err(metrics_error)?;
    Ok(counter)
}

fn metrics_error(err: prometheus::Error) -> IndexerError {
    IndexerError::Other(anyhow::anyhow!("metrics: {}", err))
}

impl Metrics {
    pub fn new() -> IndexerResult<Self> {
        let registry = Registry::new();
        Ok(Self {
            ledgers_serialized: counter(&registry, "ledgers_serialized_total", "Ledgers serialized into documents")?,
            documents_written: counter(&registry, "documents_written_total", "Documents accepted by the index")?,
            bulk_requests: counter(&registry, "bulk_requests_total", "Bulk requests sent")?,
            bulk_retries: counter(&registry, "bulk_retries_total", "Bulk requests retried after a failure")?,
            bulk_failures: counter(&registry, "bulk_failures_total", "Batches skipped after exhausting retries")?,
            missing_ledgers: counter(&registry, "missing_ledgers_total", "Ledgers found missing by gap scans")?,
            unindexable_ledgers: counter(
                &registry,
                "unindexable_ledgers_total",
                "Ledgers dropped because their ordering fields overflow a paging token",
            )?,
            registry,
        })
    }

    /// Prometheus text exposition of every counter
    pub fn encode(&self) -> IndexerResult<String> {
        let families = self.registry.gather();
        TextEncoder::new().encode_to_string(&families).map_err(metrics_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_counters() {
        let metrics = Metrics::new().unwrap();
        metrics.bulk_requests.inc_by(3);
        metrics.missing_ledgers.inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains("ledger_indexer_bulk_requests_total 3"));
        assert!(text.contains("ledger_indexer_missing_ledgers_total 1"));
        assert!(text.contains("ledger_indexer_documents_written_total 0"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.documents_written.inc();
        assert_eq!(b.documents_written.get(), 0);
    }
}
