//! Trade extraction

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::error::IndexerResult;
use crate::core::types::{EffectCounter, EffectGroup, PagingToken};
use crate::models::{amount, AssetDoc, OperationDoc, TradeDoc};
use crate::xdr::{ClaimOfferAtom, OperationResult};

/// `sold / bought` to seven decimals; a zero denominator prices at "0.0"
pub fn trade_price(sold: i64, bought: i64) -> String {
    Decimal::from(sold)
        .checked_div(Decimal::from(bought))
        .map(|price| {
            let rounded = price.round_dp_with_strategy(7, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.7}", rounded)
        })
        .unwrap_or_else(|| "0.0".to_string())
}

/// Turns the offers crossed by one operation into mirrored trade pairs
pub struct TradeExtractor;

impl TradeExtractor {
    pub fn extract(op: &OperationDoc, result: &OperationResult) -> IndexerResult<Vec<TradeDoc>> {
        if !result.is_success() || !op.kind.claims_offers() {
            return Ok(Vec::new());
        }
        let Some(atoms) = result.inner().map(|tr| tr.offers_claimed()) else {
            return Ok(Vec::new());
        };

        let base = PagingToken::effect_group(EffectGroup::Trade).merge(&op.paging_token);
        let mut counter = EffectCounter::new();
        let mut docs = Vec::with_capacity(atoms.len() * 2);
        for atom in atoms {
            let seller = atom.seller_id.to_string();
            docs.push(Self::side(
                op,
                atom,
                PagingToken::effect_index(counter.next()?).merge(&base),
                Side::Offer,
                &seller,
            ));
            docs.push(Self::side(
                op,
                atom,
                PagingToken::effect_index(counter.next()?).merge(&base),
                Side::Taker,
                &seller,
            ));
        }
        Ok(docs)
    }

    fn side(op: &OperationDoc, atom: &ClaimOfferAtom, paging_token: PagingToken, side: Side, seller: &str) -> TradeDoc {
        let (sold, sold_asset, bought, bought_asset, seller_id, buyer_id) = match side {
            Side::Offer => (
                atom.amount_sold,
                &atom.asset_sold,
                atom.amount_bought,
                &atom.asset_bought,
                seller,
                op.source_account.as_str(),
            ),
            Side::Taker => (
                atom.amount_bought,
                &atom.asset_bought,
                atom.amount_sold,
                &atom.asset_sold,
                op.source_account.as_str(),
                seller,
            ),
        };
        TradeDoc {
            paging_token,
            offer_id: atom.offer_id,
            seller_id: seller_id.to_string(),
            buyer_id: buyer_id.to_string(),
            sold_amount: amount(sold),
            sold_asset: AssetDoc::from(sold_asset),
            bought_amount: amount(bought),
            bought_asset: AssetDoc::from(bought_asset),
            price: trade_price(sold, bought),
            created_at: op.close_time,
        }
    }
}

enum Side {
    /// The offer owner's view of the claim
    Offer,
    /// The operation source's view of the claim
    Taker,
}
