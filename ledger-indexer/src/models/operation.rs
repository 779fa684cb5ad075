//! Operation documents
//!
//! One document per operation. Fields shared with the enclosing transaction
//! are copied in so an operation can be searched on its own; kind specific
//! fields live in [`OperationDetails`] and the merged result in
//! [`OperationOutcome`], both flattened into the document.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use super::{AssetDoc, MemoDoc};
use crate::core::traits::Indexable;
use crate::core::types::{IndexName, PagingToken};
use crate::xdr::{ClaimOfferAtom, OfferEntry, OperationType};

impl Serialize for OperationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceDoc {
    pub n: i32,
    pub d: i32,
}

/// One crossed offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimDoc {
    pub seller_id: String,
    pub offer_id: i64,
    pub asset_sold: AssetDoc,
    pub amount_sold: Decimal,
    pub asset_bought: AssetDoc,
    pub amount_bought: Decimal,
}

impl From<&ClaimOfferAtom> for ClaimDoc {
    fn from(atom: &ClaimOfferAtom) -> Self {
        Self {
            seller_id: atom.seller_id.to_string(),
            offer_id: atom.offer_id,
            asset_sold: AssetDoc::from(&atom.asset_sold),
            amount_sold: super::amount(atom.amount_sold),
            asset_bought: AssetDoc::from(&atom.asset_bought),
            amount_bought: super::amount(atom.amount_bought),
        }
    }
}

/// Offer left on the book by a manage offer operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferDoc {
    pub seller_id: String,
    pub offer_id: i64,
    pub selling: AssetDoc,
    pub buying: AssetDoc,
    pub amount: Decimal,
    pub price_n_d: PriceDoc,
    pub price: f64,
}

impl From<&OfferEntry> for OfferDoc {
    fn from(offer: &OfferEntry) -> Self {
        Self {
            seller_id: offer.seller_id.to_string(),
            offer_id: offer.offer_id,
            selling: AssetDoc::from(&offer.selling),
            buying: AssetDoc::from(&offer.buying),
            amount: super::amount(offer.amount),
            price_n_d: PriceDoc {
                n: offer.price.n,
                d: offer.price.d,
            },
            price: offer.price.as_f64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutDoc {
    pub account_id: String,
    pub amount: Decimal,
}

/// Kind specific operation fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_muxed_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<AssetDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_asset: Option<AssetDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_max: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<AssetDoc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_asset: Option<AssetDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buying_asset: Option<AssetDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_n_d: Option<PriceDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_dest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_key_weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trustor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trustee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorize: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bump_to: Option<i64>,
}

/// Result fields merged in from the operation result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationOutcome {
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_result_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_offers: Option<Vec<ClaimDoc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_offer_effect: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_offer: Option<OfferDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_last_destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_last_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_last_asset: Option<AssetDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_no_issuer: Option<AssetDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_source_account_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_inflation_payouts: Option<Vec<PayoutDoc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationDoc {
    pub tx_id: String,
    pub tx_index: u8,
    pub seq: u32,
    pub close_time: DateTime<Utc>,
    pub tx_source_account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<MemoDoc>,

    pub paging_token: PagingToken,
    pub index: u8,
    #[serde(rename = "type")]
    pub kind: OperationType,
    pub source_account: String,

    #[serde(flatten)]
    pub details: OperationDetails,
    #[serde(flatten)]
    pub outcome: OperationOutcome,
}

impl Indexable for OperationDoc {
    fn index_name(&self) -> IndexName {
        IndexName::Operation
    }

    fn document_id(&self) -> Option<String> {
        Some(self.paging_token.to_string())
    }
}
