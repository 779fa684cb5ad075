//! Decoded source rows

use chrono::{DateTime, Utc};

use super::unix_time;
use crate::core::error::IndexerResult;
use crate::xdr::{Hash, LedgerEntryChange, LedgerHeader, TransactionEnvelope, TransactionMeta, TransactionResult};

/// One closed ledger header
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub hash: Hash,
    pub header: LedgerHeader,
    pub close_time: DateTime<Utc>,
}

impl LedgerRow {
    pub fn new(hash: Hash, header: LedgerHeader) -> IndexerResult<Self> {
        let close_time = unix_time(header.scp_value.close_time)?;
        Ok(Self {
            hash,
            header,
            close_time,
        })
    }

    pub fn sequence(&self) -> u32 {
        self.header.ledger_seq
    }
}

/// One applied transaction with its result and meta
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub hash: Hash,
    pub ledger_seq: u32,
    /// Apply order within the ledger, starting at 1
    pub index: u32,
    pub envelope: TransactionEnvelope,
    pub result: TransactionResult,
    pub meta: TransactionMeta,
}

impl TransactionRow {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Fee charging change set of one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct FeeRow {
    pub hash: Hash,
    pub ledger_seq: u32,
    pub index: u32,
    pub changes: Vec<LedgerEntryChange>,
}
