//! Fetch, serialize and write batches of ledgers
//!
//! One batch is the unit of work for both range export and backfill: it
//! fetches its own rows, serializes them into a single bulk body and writes
//! that body. Batches share nothing but the pool, the writer and the
//! counters, and report the sequences they fetched back to the caller.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::Metrics;
use crate::core::error::{IndexerError, IndexerResult};
use crate::core::traits::LedgerSource;
use crate::models::{BulkSink, FeeRow, LedgerRow, TransactionRow};
use crate::processors::{LedgerSerializer, SerializeStats};
use crate::services::bulk_writer::{BulkWriter, WriteOutcome};
use crate::services::worker_pool::WorkerPool;

/// Ledgers one batch covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Range { start: u32, count: u32 },
    Seqs(Vec<u32>),
}

impl Selection {
    fn describe(&self) -> String {
        match self {
            Selection::Range { start, count } => format!("[{}, {})", start, u64::from(*start) + u64::from(*count)),
            Selection::Seqs(seqs) => match (seqs.first(), seqs.last()) {
                (Some(first), Some(last)) => format!("{} ledgers in [{}, {}]", seqs.len(), first, last),
                _ => "no ledgers".to_string(),
            },
        }
    }
}

/// Bulk body for a run of ledgers
#[derive(Debug, Clone, Default)]
pub struct Serialized {
    pub body: Bytes,
    pub stats: SerializeStats,
    /// Ledgers left out because their ordering fields overflow a paging token
    pub unindexable: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Sequences the source returned
    pub fetched: Vec<u32>,
    pub stats: SerializeStats,
    pub unindexable: Vec<u32>,
    pub written: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub batches: usize,
    pub fetched: Vec<u32>,
    pub stats: SerializeStats,
    /// Batches whose write exhausted its retries
    pub skipped: Vec<Selection>,
    pub unindexable: Vec<u32>,
}

impl ExportReport {
    fn absorb(&mut self, selection: Selection, batch: BatchReport) {
        self.batches += 1;
        self.fetched.extend(batch.fetched);
        self.stats.add(&batch.stats);
        self.unindexable.extend(batch.unindexable);
        if !batch.written {
            self.skipped.push(selection);
        }
    }
}

#[derive(Clone)]
pub struct Exporter {
    source: Arc<dyn LedgerSource>,
    writer: BulkWriter,
    prefix: String,
    metrics: Arc<Metrics>,
}

impl Exporter {
    pub fn new(source: Arc<dyn LedgerSource>, writer: BulkWriter, prefix: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self {
            source,
            writer,
            prefix: prefix.into(),
            metrics,
        }
    }

    pub fn source(&self) -> &Arc<dyn LedgerSource> {
        &self.source
    }

    pub fn writer(&self) -> &BulkWriter {
        &self.writer
    }

    /// Serialize `ledgers` and their transactions into one bulk body
    pub async fn fetch_and_serialize(&self, ledgers: &[LedgerRow]) -> IndexerResult<Serialized> {
        let seqs: Vec<u32> = ledgers.iter().map(LedgerRow::sequence).collect();
        let txs = group_by_ledger(self.source.transactions_for(&seqs).await?, |tx: &TransactionRow| tx.ledger_seq);
        let fees = group_by_ledger(self.source.fee_changes_for(&seqs).await?, |fee: &FeeRow| fee.ledger_seq);

        serialize_rows(ledgers, &txs, &fees, &self.prefix, &self.metrics)
    }

    /// Fetch, serialize and write one batch
    pub async fn export_batch(&self, selection: &Selection) -> IndexerResult<BatchReport> {
        let ledgers = match selection {
            Selection::Range { start, count } => self.source.ledgers_in_range(*start, *count).await?,
            Selection::Seqs(seqs) => self.source.ledgers_by_seq(seqs).await?,
        };
        let fetched: Vec<u32> = ledgers.iter().map(LedgerRow::sequence).collect();
        if ledgers.is_empty() {
            return Ok(BatchReport {
                fetched,
                written: true,
                ..BatchReport::default()
            });
        }

        let Serialized {
            body,
            stats,
            unindexable,
        } = self.fetch_and_serialize(&ledgers).await?;
        let written = match self.writer.write(body, stats.documents()).await {
            WriteOutcome::Written { .. } => true,
            WriteOutcome::Exhausted { attempts, last_error } => {
                warn!(
                    "Skipping batch {} after {} failed attempts: {}",
                    selection.describe(),
                    attempts,
                    last_error
                );
                false
            }
        };
        Ok(BatchReport {
            fetched,
            stats,
            unindexable,
            written,
        })
    }

    /// Run every selection on the pool and merge the batch reports
    pub async fn export_all(&self, pool: &WorkerPool, selections: Vec<Selection>) -> IndexerResult<ExportReport> {
        let exporter = self.clone();
        let reports = pool
            .map(selections, move |selection| {
                let exporter = exporter.clone();
                async move {
                    let report = exporter.export_batch(&selection).await?;
                    Ok((selection, report))
                }
            })
            .await?;

        let mut total = ExportReport::default();
        for (selection, report) in reports {
            total.absorb(selection, report);
        }
        Ok(total)
    }

    /// Export `[start, start + count)` in `batch` sized ranges
    pub async fn export_range(&self, pool: &WorkerPool, start: u32, count: u32, batch: u32) -> IndexerResult<ExportReport> {
        let selections = range_batches(start, count, batch);
        info!(
            "Exporting {} ledgers from {} in {} batches on {} workers",
            count,
            start,
            selections.len(),
            pool.workers()
        );
        let report = self.export_all(pool, selections).await?;
        info!(
            "Exported {} ledgers, {} documents, {} batches skipped, {} ledgers unindexable",
            report.fetched.len(),
            report.stats.documents(),
            report.skipped.len(),
            report.unindexable.len()
        );
        Ok(report)
    }
}

/// `[start, start + count)` as consecutive ranges of at most `batch`
pub fn range_batches(start: u32, count: u32, batch: u32) -> Vec<Selection> {
    let batch = batch.max(1);
    let end = u64::from(start) + u64::from(count);
    let mut out = Vec::new();
    let mut from = u64::from(start);
    while from < end {
        let n = (end - from).min(u64::from(batch));
        out.push(Selection::Range {
            start: from as u32,
            count: n as u32,
        });
        from += n;
    }
    out
}

fn group_by_ledger<R>(rows: Vec<R>, seq: impl Fn(&R) -> u32) -> BTreeMap<u32, Vec<R>> {
    let mut grouped: BTreeMap<u32, Vec<R>> = BTreeMap::new();
    for row in rows {
        grouped.entry(seq(&row)).or_default().push(row);
    }
    grouped
}

/// Serialize already fetched rows into one bulk body.
///
/// Each ledger is serialized on its own so a ledger whose transactions,
/// operations or effects overflow the paging token is dropped whole and
/// reported, without costing the rest of the body.
pub fn serialize_rows(
    ledgers: &[LedgerRow],
    txs: &BTreeMap<u32, Vec<TransactionRow>>,
    fees: &BTreeMap<u32, Vec<FeeRow>>,
    prefix: &str,
    metrics: &Metrics,
) -> IndexerResult<Serialized> {
    let serializer = LedgerSerializer::new();
    let mut body = Vec::new();
    let mut out = Serialized::default();

    for ledger in ledgers {
        let seq = ledger.sequence();
        let ledger_txs = txs.get(&seq).map(Vec::as_slice).unwrap_or(&[]);
        let ledger_fees = fees.get(&seq).map(Vec::as_slice).unwrap_or(&[]);
        let mut sink = BulkSink::new(Vec::new(), prefix);

        match serializer.serialize(ledger, ledger_txs, ledger_fees, &mut sink) {
            Ok(stats) => {
                body.extend_from_slice(&sink.into_inner());
                out.stats.add(&stats);
                metrics.ledgers_serialized.inc();
            }
            Err(IndexerError::OrderingOverflow { field, value }) => {
                warn!("Ledger {} cannot be indexed: {} {} does not fit a paging token", seq, field, value);
                metrics.unindexable_ledgers.inc();
                out.unindexable.push(seq);
            }
            Err(e) => return Err(e),
        }
    }

    out.body = Bytes::from(body);
    Ok(out)
}
