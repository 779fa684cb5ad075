//! Gap detection and backfill
//!
//! Scans the ledger index window by window for sequences it does not hold,
//! then re-exports exactly those sequences on the worker pool. Whatever the
//! source database could not return is reported, not treated as an error.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::Metrics;
use crate::core::error::IndexerResult;
use crate::core::traits::DocumentIndex;
use crate::processors::SerializeStats;
use crate::services::exporter::{Exporter, Selection};
use crate::services::worker_pool::WorkerPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapFillState {
    Scanning,
    Backfilling,
    Done,
}

#[derive(Debug, Clone, Copy)]
pub struct GapFillOptions {
    pub scan_window: u32,
    pub backfill_batch: u32,
    pub dry_run: bool,
}

impl Default for GapFillOptions {
    fn default() -> Self {
        Self {
            scan_window: 100,
            backfill_batch: 50,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GapReport {
    /// Scanned `[start, end)`; `None` when the index was empty
    pub range: Option<(u32, u32)>,
    pub missing: Vec<u32>,
    /// Missing from the index and absent from the source database too
    pub missing_in_source: Vec<u32>,
    /// Backfill batches whose write exhausted its retries
    pub skipped: Vec<Selection>,
    /// Fetched but dropped: their ordering fields overflow a paging token
    pub unindexable: Vec<u32>,
    pub stats: SerializeStats,
    pub backfilled: bool,
}

pub struct GapFiller {
    index: Arc<dyn DocumentIndex>,
    exporter: Exporter,
    pool: WorkerPool,
    options: GapFillOptions,
    metrics: Arc<Metrics>,
}

impl GapFiller {
    pub fn new(
        index: Arc<dyn DocumentIndex>,
        exporter: Exporter,
        pool: WorkerPool,
        options: GapFillOptions,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            index,
            exporter,
            pool,
            options,
            metrics,
        }
    }

    /// Scan `[start, start + count)`, or the index's own bounds when either
    /// is not given, and backfill what is missing unless this is a dry run.
    pub async fn run(&self, start: Option<u32>, count: Option<u32>) -> IndexerResult<GapReport> {
        let mut report = GapReport::default();
        let mut state = GapFillState::Scanning;

        loop {
            debug!("Gap filler state {:?}", state);
            state = match state {
                GapFillState::Scanning => {
                    let Some((lo, hi)) = self.scan_range(start, count).await? else {
                        info!("Ledger index is empty, nothing to scan");
                        return Ok(report);
                    };
                    report.range = Some((lo, hi));
                    report.missing = self.scan(lo, hi).await?;
                    self.metrics.missing_ledgers.inc_by(report.missing.len() as u64);
                    info!("Found {} missing ledgers in [{}, {})", report.missing.len(), lo, hi);

                    if report.missing.is_empty() || self.options.dry_run {
                        GapFillState::Done
                    } else {
                        GapFillState::Backfilling
                    }
                }
                GapFillState::Backfilling => {
                    self.backfill(&mut report).await?;
                    GapFillState::Done
                }
                GapFillState::Done => return Ok(report),
            };
        }
    }

    async fn scan_range(&self, start: Option<u32>, count: Option<u32>) -> IndexerResult<Option<(u32, u32)>> {
        if let (Some(start), Some(count)) = (start, count) {
            return Ok(Some((start, start.saturating_add(count))));
        }
        let Some((min, max)) = self.index.ledger_seq_bounds().await? else {
            return Ok(None);
        };
        let lo = start.unwrap_or(min);
        let hi = match count {
            Some(count) => lo.saturating_add(count),
            None => max.saturating_add(1),
        };
        Ok(Some((lo, hi)))
    }

    /// Sequences in `[lo, hi)` the index does not hold, ascending.
    ///
    /// Gaps are found between consecutive held sequences, carried across
    /// windows. A window holding nothing is missing from just after the last
    /// held sequence to its end. Sequences after the last held one are only
    /// reported once a later window is reached, so the tail of the final
    /// window is never flagged.
    pub async fn scan(&self, lo: u32, hi: u32) -> IndexerResult<Vec<u32>> {
        let window = u64::from(self.options.scan_window.max(1));
        let (lo, hi) = (u64::from(lo), u64::from(hi));
        let mut missing = Vec::new();
        // last held (or flagged) sequence; everything up to it is accounted for
        let mut prev = lo.checked_sub(1);
        let mut from = lo;

        while from < hi {
            let to = (from + window).min(hi);
            let held = self.index.ledger_seqs_in(from as u32, to as u32).await?;
            if held.is_empty() {
                let first = prev.map_or(from, |p| p + 1);
                missing.extend((first..to).map(|seq| seq as u32));
                prev = Some(to - 1);
            } else {
                for seq in held {
                    let seq = u64::from(seq);
                    let first = prev.map_or(lo, |p| p + 1);
                    missing.extend((first..seq).map(|seq| seq as u32));
                    prev = Some(prev.map_or(seq, |p| p.max(seq)));
                }
            }
            from = to;
        }

        Ok(missing)
    }

    async fn backfill(&self, report: &mut GapReport) -> IndexerResult<()> {
        let batch = self.options.backfill_batch.max(1) as usize;
        let selections: Vec<Selection> = report
            .missing
            .chunks(batch)
            .map(|chunk| Selection::Seqs(chunk.to_vec()))
            .collect();
        info!(
            "Backfilling {} ledgers in {} batches on {} workers",
            report.missing.len(),
            selections.len(),
            self.pool.workers()
        );

        let export = self.exporter.export_all(&self.pool, selections).await?;
        let fetched: BTreeSet<u32> = export.fetched.iter().copied().collect();
        report.missing_in_source = report
            .missing
            .iter()
            .copied()
            .filter(|seq| !fetched.contains(seq))
            .collect();
        report.skipped = export.skipped;
        report.unindexable = export.unindexable;
        report.stats = export.stats;
        report.backfilled = true;

        if !report.missing_in_source.is_empty() {
            warn!(
                "{} ledgers are missing from the source database too",
                report.missing_in_source.len()
            );
        }
        if !report.skipped.is_empty() {
            warn!("{} backfill batches were not written", report.skipped.len());
        }
        if !report.unindexable.is_empty() {
            warn!("{} ledgers cannot be indexed: {:?}", report.unindexable.len(), report.unindexable);
        }
        Ok(())
    }
}
