//! Index lifecycle and status reporting

use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;

use crate::core::error::{IndexerError, IndexerResult};
use crate::core::traits::{DocumentIndex, LedgerSource, RangeCount};
use crate::core::types::{IndexName, SeqGap};
use crate::database::mapping_for;

/// Create every index with its mapping; existing indexes are left alone
pub async fn create_indexes(index: &dyn DocumentIndex) -> IndexerResult<()> {
    for name in IndexName::ALL {
        index.create_index(name, &mapping_for(name)).await?;
    }
    Ok(())
}

/// Delete every index; missing indexes are not an error
pub async fn delete_indexes(index: &dyn DocumentIndex) -> IndexerResult<()> {
    for name in IndexName::ALL {
        index.delete_index(name).await?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexCount {
    pub index: IndexName,
    pub documents: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Lowest and highest indexed ledger
    pub indexed_range: Option<(u32, u32)>,
    pub counts: Vec<IndexCount>,
    /// Ledger documents per bucket of the indexed range
    pub ledger_buckets: Vec<RangeCount>,
    pub source_first: Option<u32>,
    pub source_last: Option<u32>,
    pub source_gaps: Vec<SeqGap>,
}

impl StatsReport {
    /// Ledgers the indexed range should hold but does not
    pub fn index_shortfall(&self) -> u64 {
        let Some((min, max)) = self.indexed_range else {
            return 0;
        };
        let expected = u64::from(max - min) + 1;
        let held = self
            .counts
            .iter()
            .find(|c| c.index == IndexName::Ledger)
            .map_or(0, |c| c.documents);
        expected.saturating_sub(held)
    }
}

/// Gather index and source state; `bucket` sizes the per-range ledger counts
pub async fn collect_stats(
    index: &Arc<dyn DocumentIndex>,
    source: &Arc<dyn LedgerSource>,
    bucket: u32,
) -> IndexerResult<StatsReport> {
    let indexed_range = index.ledger_seq_bounds().await?;

    let counts = try_join_all(IndexName::ALL.into_iter().map(|name| async move {
        Ok::<_, IndexerError>(IndexCount {
            index: name,
            documents: index.count(name).await?,
        })
    }))
    .await?;

    let ledger_buckets = match indexed_range {
        Some((min, max)) => {
            index
                .ledger_counts_by_range(min, max.saturating_add(1), bucket.max(1))
                .await?
        }
        None => Vec::new(),
    };

    let (source_first, source_last, source_gaps) =
        futures::try_join!(source.first_ledger_seq(), source.last_ledger_seq(), source.ledger_gaps())?;

    Ok(StatsReport {
        indexed_range,
        counts,
        ledger_buckets,
        source_first,
        source_last,
        source_gaps,
    })
}
