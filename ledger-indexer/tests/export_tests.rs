//! Range export, live tailing and index administration against in-memory stores

mod common;

use anyhow::Result;
use common::{MemoryIndex, MemorySource};
use ledger_indexer::api::Metrics;
use ledger_indexer::core::{IndexName, LedgerSource};
use ledger_indexer::services::{
    collect_stats, create_indexes, delete_indexes, BulkWriter, Exporter, IngestStep, LiveIngester, Selection,
    WorkerPool,
};
use std::sync::Arc;
use std::time::Duration;

fn exporter(index: Arc<MemoryIndex>, source: MemorySource, retries: u32) -> Result<(Exporter, Arc<Metrics>)> {
    let metrics = Arc::new(Metrics::new()?);
    let writer = BulkWriter::new(index, retries, Duration::ZERO, metrics.clone());
    Ok((Exporter::new(Arc::new(source), writer, "", metrics.clone()), metrics))
}

#[tokio::test]
async fn test_export_range_in_batches() -> Result<()> {
    let index = Arc::new(MemoryIndex::default());
    let (exporter, metrics) = exporter(index.clone(), MemorySource::with_ledgers(1..=25), 0)?;

    let report = exporter.export_range(&WorkerPool::new(3), 1, 25, 10).await?;

    assert_eq!(report.batches, 3);
    assert_eq!(report.fetched.len(), 25);
    assert_eq!(report.stats.ledgers, 25);
    assert_eq!(report.stats.transactions, 25);
    assert_eq!(report.stats.operations, 25);
    assert!(report.stats.balances > 0);
    assert!(report.skipped.is_empty());
    assert_eq!(index.bulk_calls(), 3);
    assert_eq!(index.ledger_seqs(), (1..=25).collect::<Vec<_>>());
    assert_eq!(index.documents_in("tx"), 25);
    assert_eq!(metrics.ledgers_serialized.get(), 25);
    assert_eq!(metrics.documents_written.get(), report.stats.documents() as u64);
    Ok(())
}

#[tokio::test]
async fn test_reexport_replaces_documents() -> Result<()> {
    let index = Arc::new(MemoryIndex::default());
    let (exporter, _) = exporter(index.clone(), MemorySource::with_ledgers(1..=5), 0)?;
    let pool = WorkerPool::new(2);

    exporter.export_range(&pool, 1, 5, 2).await?;
    let (ops, balances) = (index.documents_in("op"), index.documents_in("balance"));
    exporter.export_range(&pool, 1, 5, 5).await?;

    assert_eq!(index.documents_in("op"), ops);
    assert_eq!(index.documents_in("balance"), balances);
    assert_eq!(index.documents_in("ledger"), 5);
    Ok(())
}

#[tokio::test]
async fn test_transient_failure_is_retried() -> Result<()> {
    let index = Arc::new(MemoryIndex::default());
    index.fail_next(2);
    let (exporter, metrics) = exporter(index.clone(), MemorySource::with_ledgers(1..=3), 3)?;

    let report = exporter.export_batch(&Selection::Range { start: 1, count: 3 }).await?;

    assert!(report.written);
    assert_eq!(index.bulk_calls(), 3);
    assert_eq!(metrics.bulk_retries.get(), 2);
    assert_eq!(index.ledger_seqs(), vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_unwritable_batch_does_not_stop_the_export() -> Result<()> {
    let index = Arc::new(MemoryIndex::default());
    // the first batch to reach the index fails both attempts
    index.fail_next(2);
    let (exporter, _) = exporter(index.clone(), MemorySource::with_ledgers(1..=4), 1)?;

    let report = exporter.export_range(&WorkerPool::new(1), 1, 4, 2).await?;

    assert_eq!(report.skipped, vec![Selection::Range { start: 1, count: 2 }]);
    assert_eq!(index.ledger_seqs(), vec![3, 4]);
    Ok(())
}

#[tokio::test]
async fn test_live_ingest_steps() -> Result<()> {
    let index = Arc::new(MemoryIndex::with_ledgers([1, 2]));
    let (exporter, _) = exporter(index.clone(), MemorySource::with_ledgers(1..=4), 0)?;
    let ingester = LiveIngester::new(index.clone(), exporter, Duration::from_millis(5));

    assert_eq!(ingester.resume_after(None).await?, 2);
    assert_eq!(ingester.resume_after(Some(0)).await?, 0);

    index.fail_next(1);
    assert_eq!(ingester.ingest_once(2).await?, IngestStep::Failed { seq: 3 });
    assert!(matches!(ingester.ingest_once(2).await?, IngestStep::Written { seq: 3, .. }));
    assert!(matches!(ingester.ingest_once(3).await?, IngestStep::Written { seq: 4, .. }));
    assert_eq!(ingester.ingest_once(4).await?, IngestStep::CaughtUp);
    Ok(())
}

#[tokio::test]
async fn test_live_ingest_retries_until_written() -> Result<()> {
    let index = Arc::new(MemoryIndex::default());
    index.fail_next(3);
    let (exporter, _) = exporter(index.clone(), MemorySource::with_ledgers(1..=3), 0)?;
    let ingester = LiveIngester::new(index.clone(), exporter, Duration::from_millis(5));

    let watched = index.clone();
    let caught_up = async move {
        while watched.ledger_seqs().len() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    let last = tokio::time::timeout(Duration::from_secs(5), ingester.run(None, caught_up)).await??;

    assert_eq!(last, 3);
    assert_eq!(index.ledger_seqs(), vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn test_live_ingest_passes_over_unindexable_ledger() -> Result<()> {
    let index = Arc::new(MemoryIndex::default());
    let source = MemorySource::with_ledgers(1..=3).with_busy_ledger(2, 256);
    let (exporter, _) = exporter(index.clone(), source, 0)?;
    let ingester = LiveIngester::new(index.clone(), exporter, Duration::from_millis(5));

    assert_eq!(ingester.ingest_once(1).await?, IngestStep::Unindexable { seq: 2 });
    assert_eq!(index.bulk_calls(), 0);

    let watched = index.clone();
    let caught_up = async move {
        while !watched.holds(3) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    let last = tokio::time::timeout(Duration::from_secs(5), ingester.run(Some(0), caught_up)).await??;

    assert_eq!(last, 3);
    assert_eq!(index.ledger_seqs(), vec![1, 3]);
    Ok(())
}

#[tokio::test]
async fn test_export_reports_unindexable_ledger() -> Result<()> {
    let index = Arc::new(MemoryIndex::default());
    let source = MemorySource::with_ledgers(1..=4).with_busy_ledger(3, 300);
    let (exporter, _) = exporter(index.clone(), source, 0)?;

    let report = exporter.export_range(&WorkerPool::new(1), 1, 4, 4).await?;

    assert_eq!(report.unindexable, vec![3]);
    assert!(report.skipped.is_empty());
    assert_eq!(report.fetched, vec![1, 2, 3, 4]);
    assert_eq!(index.ledger_seqs(), vec![1, 2, 4]);
    Ok(())
}

#[tokio::test]
async fn test_stats_report() -> Result<()> {
    let index: Arc<MemoryIndex> = Arc::new(MemoryIndex::with_ledgers([1, 2, 3, 7]));
    let source = MemorySource::with_ledgers([1, 2, 3, 4, 8, 9]);
    let source: Arc<dyn LedgerSource> = Arc::new(source);
    let dyn_index: Arc<dyn ledger_indexer::core::DocumentIndex> = index.clone();

    let stats = collect_stats(&dyn_index, &source, 5).await?;

    assert_eq!(stats.indexed_range, Some((1, 7)));
    assert_eq!(stats.index_shortfall(), 3);
    assert_eq!(stats.counts.len(), IndexName::ALL.len());
    assert_eq!(stats.ledger_buckets.len(), 2);
    assert_eq!(stats.ledger_buckets[0].count, 3);
    assert_eq!(stats.ledger_buckets[1].count, 1);
    assert_eq!(stats.source_first, Some(1));
    assert_eq!(stats.source_last, Some(9));
    assert_eq!(stats.source_gaps.len(), 1);
    assert_eq!(stats.source_gaps[0].count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_index_lifecycle() -> Result<()> {
    let index = MemoryIndex::default();
    create_indexes(&index).await?;
    delete_indexes(&index).await?;
    assert_eq!(index.created(), IndexName::ALL.to_vec());
    assert_eq!(index.deleted(), IndexName::ALL.to_vec());
    Ok(())
}
