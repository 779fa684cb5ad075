//! Offer event extraction

use chrono::{DateTime, Utc};

use crate::core::error::IndexerResult;
use crate::core::types::{EffectCounter, PagingToken};
use crate::models::{amount, AssetDoc, EventDoc, EventPayload, OfferAction, OfferEvent, PriceDoc};
use crate::xdr::{LedgerEntry, LedgerEntryChange, LedgerEntryData, OperationMeta};

/// Emits an event for every offer entry created or updated by a
/// transaction's operations. Removals and state snapshots are not events.
pub struct OfferExtractor {
    base: PagingToken,
    seq: u32,
    close_time: DateTime<Utc>,
}

impl OfferExtractor {
    pub fn new(base: PagingToken, seq: u32, close_time: DateTime<Utc>) -> Self {
        Self { base, seq, close_time }
    }

    pub fn extract(&self, metas: &[OperationMeta]) -> IndexerResult<Vec<EventDoc>> {
        let mut counter = EffectCounter::new();
        let mut docs = Vec::new();

        for change in metas.iter().flat_map(|meta| meta.changes.iter()) {
            let (action, entry) = match change {
                LedgerEntryChange::Created(entry) => (OfferAction::Create, entry),
                LedgerEntryChange::Updated(entry) => (OfferAction::Update, entry),
                LedgerEntryChange::State(_) | LedgerEntryChange::Removed(_) => continue,
            };
            if let Some(event) = offer_event(action, entry) {
                docs.push(EventDoc {
                    paging_token: PagingToken::effect_index(counter.next()?).merge(&self.base),
                    seq: self.seq,
                    created_at: self.close_time,
                    payload: EventPayload::Offer(event),
                });
            }
        }

        Ok(docs)
    }
}

fn offer_event(action: OfferAction, entry: &LedgerEntry) -> Option<OfferEvent> {
    let LedgerEntryData::Offer(offer) = &entry.data else {
        return None;
    };
    Some(OfferEvent {
        action,
        seller_id: offer.seller_id.to_string(),
        offer_id: offer.offer_id,
        selling: AssetDoc::from(&offer.selling),
        buying: AssetDoc::from(&offer.buying),
        amount: amount(offer.amount),
        price_n_d: PriceDoc {
            n: offer.price.n,
            d: offer.price.d,
        },
        price: offer.price.as_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EffectGroup;
    use crate::processors::fixtures::*;
    use crate::xdr::LedgerKey;

    #[test]
    fn test_offer_events_share_one_counter() {
        let metas = vec![
            OperationMeta {
                changes: vec![
                    LedgerEntryChange::State(account(ALICE, 10)),
                    LedgerEntryChange::Updated(account(ALICE, 9)),
                    LedgerEntryChange::Created(offer(ALICE, 7, 100)),
                ],
            },
            OperationMeta {
                changes: vec![
                    LedgerEntryChange::State(offer(ALICE, 7, 100)),
                    LedgerEntryChange::Updated(offer(ALICE, 7, 60)),
                    LedgerEntryChange::Removed(LedgerKey::Offer {
                        seller_id: crate::xdr::AccountId(BOB),
                        offer_id: 3,
                    }),
                ],
            },
        ];
        let base = PagingToken::transaction(5, 2).merge(&PagingToken::effect_group(EffectGroup::Offer));
        let docs = OfferExtractor::new(base, 5, DateTime::default()).extract(&metas).unwrap();

        assert_eq!(docs.len(), 2);
        let EventPayload::Offer(created) = &docs[0].payload;
        assert_eq!(created.action, OfferAction::Create);
        assert_eq!(created.offer_id, 7);
        assert_eq!(created.price, 0.5);
        let EventPayload::Offer(updated) = &docs[1].payload;
        assert_eq!(updated.action, OfferAction::Update);
        assert_eq!(updated.amount, amount(60));

        assert_eq!(docs[0].paging_token.effect_index, 1);
        assert_eq!(docs[1].paging_token.effect_index, 2);
        assert_eq!(docs[1].paging_token.operation_order, 0);
        assert_eq!(docs[1].paging_token.effect_group, EffectGroup::Offer as u8);
    }

    #[test]
    fn test_event_json_shape() {
        let metas = vec![OperationMeta {
            changes: vec![LedgerEntryChange::Created(offer(BOB, 1, 5))],
        }];
        let docs = OfferExtractor::new(PagingToken::transaction(5, 1), 5, DateTime::default())
            .extract(&metas)
            .unwrap();
        let json = serde_json::to_value(&docs[0]).unwrap();
        assert_eq!(json["type"], "offer");
        assert_eq!(json["action"], "create");
        assert_eq!(json["seq"], 5);
        assert_eq!(json["buying"]["code"], "USD");
    }
}
