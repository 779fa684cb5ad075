//! Balance change documents

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::AssetDoc;
use crate::core::traits::Indexable;
use crate::core::types::{IndexName, PagingToken};

/// Which change log a balance change was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    Fee,
    Meta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceDoc {
    pub paging_token: PagingToken,
    pub account_id: String,
    /// Balance after the change
    pub balance: Decimal,
    /// Signed change against the previous balance
    pub diff: Decimal,
    pub asset: AssetDoc,
    pub source: BalanceSource,
    pub created_at: DateTime<Utc>,
}

impl Indexable for BalanceDoc {
    fn index_name(&self) -> IndexName {
        IndexName::Balance
    }

    fn document_id(&self) -> Option<String> {
        Some(self.paging_token.to_string())
    }
}
