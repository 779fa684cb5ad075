//! Ledger header documents

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{amount, LedgerRow, TransactionRow};
use crate::core::traits::Indexable;
use crate::core::types::{IndexName, PagingToken};

#[derive(Debug, Clone, Serialize)]
pub struct LedgerDoc {
    pub paging_token: PagingToken,
    pub hash: String,
    pub prev_hash: String,
    pub bucket_list_hash: String,
    pub seq: u32,
    pub close_time: DateTime<Utc>,
    pub version: u32,
    pub total_coins: Decimal,
    pub fee_pool: Decimal,
    pub inflation_seq: u32,
    pub id_pool: u64,
    pub base_fee: u32,
    pub base_reserve: u32,
    pub max_tx_set_size: u32,
    pub successful_transaction_count: u32,
    pub failed_transaction_count: u32,
    pub operation_count: u32,
}

impl LedgerDoc {
    pub fn new(row: &LedgerRow, transactions: &[TransactionRow]) -> Self {
        let header = &row.header;
        let successful = transactions.iter().filter(|tx| tx.is_success()).count() as u32;
        let operation_count = transactions
            .iter()
            .filter(|tx| tx.is_success())
            .map(|tx| tx.envelope.operations().len() as u32)
            .sum();

        Self {
            paging_token: PagingToken::ledger(header.ledger_seq),
            hash: hex::encode(row.hash),
            prev_hash: hex::encode(header.previous_ledger_hash),
            bucket_list_hash: hex::encode(header.bucket_list_hash),
            seq: header.ledger_seq,
            close_time: row.close_time,
            version: header.ledger_version,
            total_coins: amount(header.total_coins),
            fee_pool: amount(header.fee_pool),
            inflation_seq: header.inflation_seq,
            id_pool: header.id_pool,
            base_fee: header.base_fee,
            base_reserve: header.base_reserve,
            max_tx_set_size: header.max_tx_set_size,
            successful_transaction_count: successful,
            failed_transaction_count: transactions.len() as u32 - successful,
            operation_count,
        }
    }
}

impl Indexable for LedgerDoc {
    fn index_name(&self) -> IndexName {
        IndexName::Ledger
    }

    fn document_id(&self) -> Option<String> {
        Some(self.paging_token.to_string())
    }
}
