//! Transaction documents

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::TransactionRow;
use crate::core::traits::Indexable;
use crate::core::types::{IndexName, PagingToken};
use crate::xdr::{Memo, TimeBounds};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoDoc {
    #[serde(rename = "type")]
    pub memo_type: &'static str,
    pub value: String,
}

impl MemoDoc {
    pub fn from_memo(memo: &Memo) -> Option<Self> {
        let (memo_type, value) = match memo {
            Memo::None => return None,
            Memo::Text(text) => ("text", String::from_utf8_lossy(text).into_owned()),
            Memo::Id(id) => ("id", id.to_string()),
            Memo::Hash(hash) => ("hash", base64::engine::general_purpose::STANDARD.encode(hash)),
            Memo::Return(hash) => ("return", base64::engine::general_purpose::STANDARD.encode(hash)),
        };
        Some(Self { memo_type, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBoundsDoc {
    pub min_time: u64,
    pub max_time: u64,
}

impl From<&TimeBounds> for TimeBoundsDoc {
    fn from(bounds: &TimeBounds) -> Self {
        Self {
            min_time: bounds.min_time,
            max_time: bounds.max_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDoc {
    pub id: String,
    pub paging_token: PagingToken,
    pub seq: u32,
    pub index: u8,
    pub close_time: DateTime<Utc>,
    pub account: String,
    pub account_sequence: i64,
    pub fee_account: String,
    pub fee_bump: bool,
    pub max_fee: i64,
    pub fee_charged: i64,
    pub operation_count: u32,
    pub successful: bool,
    pub result_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<MemoDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_bounds: Option<TimeBoundsDoc>,
}

impl TransactionDoc {
    pub fn new(row: &TransactionRow, order: u8, close_time: DateTime<Utc>) -> Self {
        let tx = row.envelope.tx();
        Self {
            id: hex::encode(row.hash),
            paging_token: PagingToken::transaction(row.ledger_seq, order),
            seq: row.ledger_seq,
            index: order,
            close_time,
            account: row.envelope.source_account().to_string(),
            account_sequence: tx.seq_num,
            fee_account: row.envelope.fee_account().to_string(),
            fee_bump: row.envelope.is_fee_bump(),
            max_fee: row.envelope.max_fee(),
            fee_charged: row.result.fee_charged,
            operation_count: tx.operations.len() as u32,
            successful: row.is_success(),
            result_code: row.result.code(),
            memo: MemoDoc::from_memo(&tx.memo),
            time_bounds: tx.time_bounds.as_ref().map(TimeBoundsDoc::from),
        }
    }
}

impl Indexable for TransactionDoc {
    fn index_name(&self) -> IndexName {
        IndexName::Transaction
    }

    fn document_id(&self) -> Option<String> {
        Some(self.paging_token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_docs() {
        assert_eq!(MemoDoc::from_memo(&Memo::None), None);
        let text = MemoDoc::from_memo(&Memo::Text(b"hello".to_vec())).unwrap();
        assert_eq!(text.memo_type, "text");
        assert_eq!(text.value, "hello");
        let id = MemoDoc::from_memo(&Memo::Id(u64::MAX)).unwrap();
        assert_eq!(id.value, "18446744073709551615");
        let hash = MemoDoc::from_memo(&Memo::Hash([0u8; 32])).unwrap();
        assert_eq!(hash.value, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=");
    }
}
