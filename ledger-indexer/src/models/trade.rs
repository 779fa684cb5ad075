//! Trade documents

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::AssetDoc;
use crate::core::traits::Indexable;
use crate::core::types::{IndexName, PagingToken};

/// One side of a crossed offer; every claim yields a mirrored pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeDoc {
    pub paging_token: PagingToken,
    pub offer_id: i64,
    pub seller_id: String,
    pub buyer_id: String,
    pub sold_amount: Decimal,
    pub sold_asset: AssetDoc,
    pub bought_amount: Decimal,
    pub bought_asset: AssetDoc,
    /// `sold / bought` with seven decimals
    pub price: String,
    pub created_at: DateTime<Utc>,
}

impl Indexable for TradeDoc {
    fn index_name(&self) -> IndexName {
        IndexName::Trade
    }

    fn document_id(&self) -> Option<String> {
        Some(self.paging_token.to_string())
    }
}
