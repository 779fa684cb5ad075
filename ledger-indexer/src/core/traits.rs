//! Core trait abstractions (Ports in Hexagonal Architecture)

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use super::error::IndexerResult;
use super::types::*;
use crate::models::{FeeRow, LedgerRow, TransactionRow};

/// Source-of-record port - ledger history as stored by the validator
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Ledgers with `start <= seq < start + count`, ascending
    async fn ledgers_in_range(&self, start: u32, count: u32) -> IndexerResult<Vec<LedgerRow>>;

    /// Ledgers with the given sequences, ascending; absent ones are omitted
    async fn ledgers_by_seq(&self, seqs: &[u32]) -> IndexerResult<Vec<LedgerRow>>;

    /// First ledger strictly after `seq`
    async fn next_ledger_after(&self, seq: u32) -> IndexerResult<Option<LedgerRow>>;

    /// Transactions of the given ledgers, ordered by ledger then apply order
    async fn transactions_for(&self, seqs: &[u32]) -> IndexerResult<Vec<TransactionRow>>;

    /// Fee change sets of the given ledgers, ordered by ledger then apply order
    async fn fee_changes_for(&self, seqs: &[u32]) -> IndexerResult<Vec<FeeRow>>;

    async fn first_ledger_seq(&self) -> IndexerResult<Option<u32>>;

    async fn last_ledger_seq(&self) -> IndexerResult<Option<u32>>;

    /// Missing runs inside the source's own ledger table
    async fn ledger_gaps(&self) -> IndexerResult<Vec<SeqGap>>;
}

/// Document index port - bulk writes plus the queries reconciliation needs
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Submit one newline-delimited bulk request
    async fn bulk(&self, body: Bytes) -> IndexerResult<BulkOutcome>;

    /// Lowest and highest ledger sequence in the ledger index
    async fn ledger_seq_bounds(&self) -> IndexerResult<Option<(u32, u32)>>;

    /// Sorted ledger sequences held with `lo <= seq < hi`
    async fn ledger_seqs_in(&self, lo: u32, hi: u32) -> IndexerResult<Vec<u32>>;

    async fn count(&self, index: IndexName) -> IndexerResult<u64>;

    /// Ledger document counts per `interval` sized bucket of `[start, end)`
    async fn ledger_counts_by_range(&self, start: u32, end: u32, interval: u32) -> IndexerResult<Vec<RangeCount>>;

    async fn create_index(&self, index: IndexName, body: &serde_json::Value) -> IndexerResult<()>;

    async fn delete_index(&self, index: IndexName) -> IndexerResult<()>;
}

/// A document that can be written to one of the indexes
pub trait Indexable: Serialize {
    fn index_name(&self) -> IndexName;

    /// Document id; `None` lets the index assign one
    fn document_id(&self) -> Option<String>;
}

/// Result of one bulk request that reached the index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub errors: bool,
    pub items: usize,
    pub failed_items: usize,
    pub first_error: Option<String>,
}

impl BulkOutcome {
    pub fn is_success(&self) -> bool {
        !self.errors && self.failed_items == 0
    }
}

/// Document count of one sequence bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeCount {
    pub start: u32,
    pub end: u32,
    pub count: u64,
}
