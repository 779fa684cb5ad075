//! Ledger event documents
//!
//! An [`EventDoc`] is a generic envelope (position, ledger, time) around a
//! typed payload. Offer events are the only payload kind today.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{AssetDoc, PriceDoc};
use crate::core::traits::Indexable;
use crate::core::types::{IndexName, PagingToken};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventDoc {
    pub paging_token: PagingToken,
    pub seq: u32,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Offer(OfferEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferAction {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferEvent {
    pub action: OfferAction,
    pub seller_id: String,
    pub offer_id: i64,
    pub selling: AssetDoc,
    pub buying: AssetDoc,
    pub amount: Decimal,
    pub price_n_d: PriceDoc,
    pub price: f64,
}

impl Indexable for EventDoc {
    fn index_name(&self) -> IndexName {
        match self.payload {
            EventPayload::Offer(_) => IndexName::Offer,
        }
    }

    fn document_id(&self) -> Option<String> {
        Some(self.paging_token.to_string())
    }
}
