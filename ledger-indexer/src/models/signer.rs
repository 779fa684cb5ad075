//! Signer history documents

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::traits::Indexable;
use crate::core::types::{IndexName, PagingToken};

/// A signer added, reweighted or removed (weight 0) by set-options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignerHistoryDoc {
    pub paging_token: PagingToken,
    pub account_id: String,
    pub signer: String,
    #[serde(rename = "type")]
    pub signer_type: &'static str,
    pub weight: u32,
    pub seq: u32,
    pub tx_index: u8,
    pub op_index: u8,
    pub created_at: DateTime<Utc>,
}

impl Indexable for SignerHistoryDoc {
    fn index_name(&self) -> IndexName {
        IndexName::SignerHistory
    }

    fn document_id(&self) -> Option<String> {
        Some(self.paging_token.to_string())
    }
}
