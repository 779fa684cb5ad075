//! Live ingestion
//!
//! `LiveIngester` tails the source database one ledger at a time.
//! `StreamIngester` consumes ledger close frames produced by a replaying
//! validator. Both feed the same serializer and bulk writer as export.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

use crate::api::Metrics;
use crate::core::error::IndexerResult;
use crate::core::traits::DocumentIndex;
use crate::processors::SerializeStats;
use crate::services::bulk_writer::{BulkWriter, WriteOutcome};
use crate::services::exporter::{serialize_rows, Exporter, Serialized};
use crate::stream::{FrameReader, LedgerCloseDecoder, LedgerCloseRecord};

/// Result of one tailing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStep {
    /// No ledger after the cursor yet
    CaughtUp,
    Written { seq: u32, documents: usize },
    /// The ledger was fetched but its write exhausted every retry
    Failed { seq: u32 },
    /// The ledger overflows a paging token and can never be indexed
    Unindexable { seq: u32 },
}

pub struct LiveIngester {
    index: Arc<dyn DocumentIndex>,
    exporter: Exporter,
    poll_interval: Duration,
}

impl LiveIngester {
    pub fn new(index: Arc<dyn DocumentIndex>, exporter: Exporter, poll_interval: Duration) -> Self {
        Self {
            index,
            exporter,
            poll_interval,
        }
    }

    /// Cursor to start tailing from: the given sequence, else the highest
    /// indexed ledger, else the start of history
    pub async fn resume_after(&self, after: Option<u32>) -> IndexerResult<u32> {
        if let Some(after) = after {
            return Ok(after);
        }
        Ok(self.index.ledger_seq_bounds().await?.map_or(0, |(_, max)| max))
    }

    /// Index the first ledger after `after`
    pub async fn ingest_once(&self, after: u32) -> IndexerResult<IngestStep> {
        let Some(ledger) = self.exporter.source().next_ledger_after(after).await? else {
            return Ok(IngestStep::CaughtUp);
        };
        let seq = ledger.sequence();
        let Serialized {
            body,
            stats,
            unindexable,
        } = self.exporter.fetch_and_serialize(std::slice::from_ref(&ledger)).await?;
        if unindexable.contains(&seq) {
            return Ok(IngestStep::Unindexable { seq });
        }

        match self.exporter.writer().write(body, stats.documents()).await {
            WriteOutcome::Written { .. } => {
                debug!("Ingested ledger {} ({} documents)", seq, stats.documents());
                Ok(IngestStep::Written {
                    seq,
                    documents: stats.documents(),
                })
            }
            WriteOutcome::Exhausted { attempts, last_error } => {
                warn!("Ledger {} not written after {} attempts: {}", seq, attempts, last_error);
                Ok(IngestStep::Failed { seq })
            }
        }
    }

    /// Tail until `shutdown` resolves; returns the last ledger written.
    ///
    /// A ledger that could not be written is retried after the poll interval
    /// so the tail never moves past a hole. An unindexable ledger is passed
    /// over with a warning since no retry can change it.
    pub async fn run<S>(&self, after: Option<u32>, shutdown: S) -> IndexerResult<u32>
    where
        S: Future<Output = ()>,
    {
        let mut cursor = self.resume_after(after).await?;
        info!("Tailing ledgers after {}", cursor);
        tokio::pin!(shutdown);

        loop {
            let step = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Stopping live ingest after ledger {}", cursor);
                    return Ok(cursor);
                }
                step = self.ingest_once(cursor) => step?,
            };

            match step {
                IngestStep::Written { seq, .. } => cursor = seq,
                IngestStep::Unindexable { seq } => {
                    warn!("Passing over unindexable ledger {}", seq);
                    cursor = seq;
                }
                IngestStep::CaughtUp | IngestStep::Failed { .. } => {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            info!("Stopping live ingest after ledger {}", cursor);
                            return Ok(cursor);
                        }
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamReport {
    pub ledgers: usize,
    pub stats: SerializeStats,
    /// Ledgers whose write exhausted its retries
    pub skipped: Vec<u32>,
    pub unindexable: Vec<u32>,
}

pub struct StreamIngester {
    decoder: LedgerCloseDecoder,
    writer: BulkWriter,
    prefix: String,
    metrics: Arc<Metrics>,
}

impl StreamIngester {
    pub fn new(decoder: LedgerCloseDecoder, writer: BulkWriter, prefix: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self {
            decoder,
            writer,
            prefix: prefix.into(),
            metrics,
        }
    }

    /// Index every ledger close frame until the stream ends
    pub async fn run<R: AsyncRead + Unpin>(&self, reader: R) -> IndexerResult<StreamReport> {
        let mut frames = FrameReader::new(reader);
        let mut report = StreamReport::default();

        while let Some(frame) = frames.next_frame().await? {
            let record = self.decoder.decode(&frame)?;
            let seq = record.sequence();
            let stats = self.write_record(record, &mut report).await?;
            report.ledgers += 1;
            report.stats.add(&stats);
            debug!("Streamed ledger {} ({} documents)", seq, stats.documents());
        }

        info!(
            "Stream ended after {} ledgers, {} documents, {} skipped",
            report.ledgers,
            report.stats.documents(),
            report.skipped.len()
        );
        Ok(report)
    }

    async fn write_record(&self, record: LedgerCloseRecord, report: &mut StreamReport) -> IndexerResult<SerializeStats> {
        let seq = record.sequence();
        let txs = BTreeMap::from([(seq, record.transactions)]);
        let fees = BTreeMap::from([(seq, record.fees)]);
        let Serialized {
            body,
            stats,
            unindexable,
        } = serialize_rows(std::slice::from_ref(&record.ledger), &txs, &fees, &self.prefix, &self.metrics)?;
        report.unindexable.extend(unindexable);

        if let WriteOutcome::Exhausted { attempts, last_error } = self.writer.write(body, stats.documents()).await {
            // the frame cannot be replayed; a later gap fill repairs it
            warn!("Ledger {} not written after {} attempts: {}", seq, attempts, last_error);
            report.skipped.push(seq);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{IndexError, IndexerError};
    use crate::core::traits::{BulkOutcome, RangeCount};
    use crate::core::types::IndexName;
    use crate::stream::ledger_close::testing::{bump_tx, ledger_close, simple_ledger_close, tx_hash, PASSPHRASE};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    /// Records bulk bodies; fails every request while `down` is set
    #[derive(Default)]
    struct Recording {
        bodies: Mutex<Vec<Bytes>>,
        down: Mutex<bool>,
    }

    #[async_trait]
    impl DocumentIndex for Recording {
        async fn bulk(&self, body: Bytes) -> IndexerResult<BulkOutcome> {
            if *self.down.lock().unwrap() {
                return Err(IndexError::Transport("down".to_string()).into());
            }
            self.bodies.lock().unwrap().push(body);
            Ok(BulkOutcome::default())
        }
        async fn ledger_seq_bounds(&self) -> IndexerResult<Option<(u32, u32)>> {
            Ok(None)
        }
        async fn ledger_seqs_in(&self, _lo: u32, _hi: u32) -> IndexerResult<Vec<u32>> {
            Ok(Vec::new())
        }
        async fn count(&self, _index: IndexName) -> IndexerResult<u64> {
            Ok(0)
        }
        async fn ledger_counts_by_range(&self, _start: u32, _end: u32, _interval: u32) -> IndexerResult<Vec<RangeCount>> {
            Ok(Vec::new())
        }
        async fn create_index(&self, _index: IndexName, _body: &serde_json::Value) -> IndexerResult<()> {
            Ok(())
        }
        async fn delete_index(&self, _index: IndexName) -> IndexerResult<()> {
            Ok(())
        }
    }

    fn framed(frames: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        for frame in frames {
            out.extend_from_slice(&(frame.len() as u32 | 0x8000_0000).to_be_bytes());
            out.extend_from_slice(frame);
        }
        out
    }

    fn ingester(index: Arc<Recording>) -> StreamIngester {
        let metrics = Arc::new(Metrics::new().unwrap());
        let writer = BulkWriter::new(index, 1, Duration::ZERO, metrics.clone());
        StreamIngester::new(LedgerCloseDecoder::new(PASSPHRASE), writer, "", metrics)
    }

    #[tokio::test]
    async fn test_streams_each_frame_as_one_bulk_request() {
        let index = Arc::new(Recording::default());
        let input = framed(&[simple_ledger_close(10), simple_ledger_close(11)]);

        let report = ingester(index.clone()).run(input.as_slice()).await.unwrap();

        assert_eq!(report.ledgers, 2);
        assert_eq!(report.stats.ledgers, 2);
        assert_eq!(report.stats.transactions, 2);
        assert_eq!(report.stats.operations, 2);
        assert!(report.skipped.is_empty());

        let bodies = index.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 2);
        let first_action: serde_json::Value =
            serde_json::from_slice(bodies[1].split(|b| *b == b'\n').next().unwrap()).unwrap();
        assert_eq!(first_action["index"]["_index"], "ledger");
        assert_eq!(first_action["index"]["_id"], (11u64 << 32).to_string());
    }

    #[tokio::test]
    async fn test_unwritable_ledger_is_reported() {
        let index = Arc::new(Recording::default());
        *index.down.lock().unwrap() = true;
        let input = framed(&[simple_ledger_close(10)]);

        let report = ingester(index).run(input.as_slice()).await.unwrap();
        assert_eq!(report.ledgers, 1);
        assert_eq!(report.skipped, vec![10]);
    }

    #[tokio::test]
    async fn test_overfull_ledger_is_dropped_and_the_stream_continues() {
        let index = Arc::new(Recording::default());
        let txs: Vec<Vec<u8>> = (0..256).map(|n| bump_tx(1_000 + n)).collect();
        let hashes: Vec<_> = txs.iter().map(|tx| tx_hash(tx)).collect();
        let input = framed(&[ledger_close(10, &txs, &hashes), simple_ledger_close(11)]);

        let report = ingester(index.clone()).run(input.as_slice()).await.unwrap();

        assert_eq!(report.ledgers, 2);
        assert_eq!(report.unindexable, vec![10]);
        assert!(report.skipped.is_empty());
        assert_eq!(report.stats.ledgers, 1);
        // nothing was sent for the dropped ledger
        assert_eq!(index.bodies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_frame_stops_the_stream() {
        let index = Arc::new(Recording::default());
        let input = framed(&[vec![0, 0, 0, 0, 1]]);
        assert!(matches!(
            ingester(index).run(input.as_slice()).await,
            Err(IndexerError::Decode(_))
        ));
    }
}
