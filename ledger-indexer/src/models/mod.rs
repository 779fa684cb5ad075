//! Index documents and the decoded source rows they are built from

pub mod balance;
pub mod bulk;
pub mod ledger;
pub mod offer;
pub mod operation;
pub mod rows;
pub mod signer;
pub mod trade;
pub mod transaction;

pub use balance::*;
pub use bulk::BulkSink;
pub use ledger::*;
pub use offer::*;
pub use operation::*;
pub use rows::*;
pub use signer::*;
pub use trade::*;
pub use transaction::*;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::error::{DecodeError, IndexerResult};
use crate::xdr::{Asset, AMOUNT_SCALE};

/// Fixed point stroop amount as a seven decimal place number
pub fn amount(stroops: i64) -> Decimal {
    Decimal::new(stroops, AMOUNT_SCALE)
}

/// Ledger close time from unix seconds
pub fn unix_time(secs: u64) -> IndexerResult<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| DecodeError::Invalid(format!("close time {} out of range", secs)).into())
}

/// Asset as stored in documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDoc {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// `code-issuer`, or `native`; a single keyword to aggregate on
    pub key: String,
}

impl From<&Asset> for AssetDoc {
    fn from(asset: &Asset) -> Self {
        let asset_type = match asset {
            Asset::Native => "native",
            Asset::CreditAlphanum4 { .. } => "credit_alphanum4",
            Asset::CreditAlphanum12 { .. } => "credit_alphanum12",
        };
        let code = asset.code();
        let issuer = asset.issuer().map(|issuer| issuer.to_string());
        let key = match &issuer {
            Some(issuer) => format!("{}-{}", code, issuer),
            None => code.clone(),
        };
        Self {
            asset_type: asset_type.to_string(),
            code,
            issuer,
            key,
        }
    }
}
