//! Operation document factory

use base64::Engine;

use crate::core::error::IndexerResult;
use crate::core::types::{order_from_position, PagingToken};
use crate::models::{
    amount, AssetDoc, ClaimDoc, OfferDoc, OperationDetails, OperationDoc, OperationOutcome, PayoutDoc, PriceDoc,
    TransactionDoc,
};
use crate::xdr::{
    AccountMergeResult, Asset, InflationResult, ManageOfferEffect, ManageOfferResult, MuxedAccount, Operation,
    OperationBody, OperationResult, OperationResultTr, PathPaymentResult, Price,
};

/// Builds one operation document from the raw operation and, when known,
/// its result.
pub struct OperationFactory;

impl OperationFactory {
    pub fn produce(
        tx: &TransactionDoc,
        op: &Operation,
        result: Option<&OperationResult>,
        position: usize,
    ) -> IndexerResult<OperationDoc> {
        let index = order_from_position("operation_order", position)?;
        let source_account = match &op.source_account {
            Some(source) => source.account_id().to_string(),
            None => tx.account.clone(),
        };

        Ok(OperationDoc {
            tx_id: tx.id.clone(),
            tx_index: tx.index,
            seq: tx.seq,
            close_time: tx.close_time,
            tx_source_account: tx.account.clone(),
            memo: tx.memo.clone(),
            paging_token: PagingToken::operation(tx.seq, tx.index, index),
            index,
            kind: op.body.kind(),
            details: details(&op.body, &source_account),
            outcome: result.map(outcome).unwrap_or_default(),
            source_account,
        })
    }
}

fn asset(asset: &Asset) -> Option<AssetDoc> {
    Some(AssetDoc::from(asset))
}

fn price(price: &Price) -> (Option<f64>, Option<PriceDoc>) {
    (Some(price.as_f64()), Some(PriceDoc { n: price.n, d: price.d }))
}

fn destination(account: &MuxedAccount) -> (Option<String>, Option<u64>) {
    (Some(account.account_id().to_string()), account.id)
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn details(body: &OperationBody, source_account: &str) -> OperationDetails {
    let mut d = OperationDetails::default();
    match body {
        OperationBody::CreateAccount(op) => {
            d.destination_account_id = Some(op.destination.to_string());
            d.starting_balance = Some(amount(op.starting_balance));
        }
        OperationBody::Payment(op) => {
            (d.destination_account_id, d.destination_muxed_id) = destination(&op.destination);
            d.asset = asset(&op.asset);
            d.amount = Some(amount(op.amount));
        }
        OperationBody::PathPaymentStrictReceive(op) => {
            (d.destination_account_id, d.destination_muxed_id) = destination(&op.destination);
            d.asset = asset(&op.dest_asset);
            d.amount = Some(amount(op.dest_amount));
            d.source_asset = asset(&op.send_asset);
            d.source_max = Some(amount(op.send_max));
            d.path = Some(op.path.iter().map(AssetDoc::from).collect());
        }
        OperationBody::PathPaymentStrictSend(op) => {
            (d.destination_account_id, d.destination_muxed_id) = destination(&op.destination);
            d.asset = asset(&op.dest_asset);
            d.destination_min = Some(amount(op.dest_min));
            d.source_asset = asset(&op.send_asset);
            d.source_amount = Some(amount(op.send_amount));
            d.path = Some(op.path.iter().map(AssetDoc::from).collect());
        }
        OperationBody::ManageSellOffer(op) => {
            d.selling_asset = asset(&op.selling);
            d.buying_asset = asset(&op.buying);
            d.amount = Some(amount(op.amount));
            (d.price, d.price_n_d) = price(&op.price);
            d.offer_id = Some(op.offer_id);
        }
        OperationBody::ManageBuyOffer(op) => {
            d.selling_asset = asset(&op.selling);
            d.buying_asset = asset(&op.buying);
            d.amount = Some(amount(op.buy_amount));
            (d.price, d.price_n_d) = price(&op.price);
            d.offer_id = Some(op.offer_id);
        }
        OperationBody::CreatePassiveSellOffer(op) => {
            d.selling_asset = asset(&op.selling);
            d.buying_asset = asset(&op.buying);
            d.amount = Some(amount(op.amount));
            (d.price, d.price_n_d) = price(&op.price);
            d.passive = Some(true);
        }
        OperationBody::SetOptions(op) => {
            d.inflation_dest = op.inflation_dest.map(|account| account.to_string());
            d.set_flags = op.set_flags;
            d.clear_flags = op.clear_flags;
            d.master_key_weight = op.master_weight;
            d.low_threshold = op.low_threshold;
            d.medium_threshold = op.med_threshold;
            d.high_threshold = op.high_threshold;
            d.home_domain = op.home_domain.as_deref().map(text);
            if let Some(signer) = &op.signer {
                d.signer_key = Some(signer.key.to_string());
                d.signer_type = Some(signer.key.type_name());
                d.signer_weight = Some(signer.weight);
            }
        }
        OperationBody::ChangeTrust(op) => {
            d.asset = asset(&op.line);
            d.limit = Some(amount(op.limit));
            d.trustor = Some(source_account.to_string());
            d.trustee = op.line.issuer().map(|issuer| issuer.to_string());
        }
        OperationBody::AllowTrust(op) => {
            d.trustor = Some(op.trustor.to_string());
            d.trustee = Some(source_account.to_string());
            d.asset = Some(AssetDoc {
                asset_type: match op.asset {
                    crate::xdr::AssetCode::Alphanum4(_) => "credit_alphanum4".to_string(),
                    crate::xdr::AssetCode::Alphanum12(_) => "credit_alphanum12".to_string(),
                },
                code: op.asset.to_string(),
                issuer: Some(source_account.to_string()),
                key: format!("{}-{}", op.asset, source_account),
            });
            d.authorize = Some(op.authorize);
        }
        OperationBody::AccountMerge(into) => {
            (d.destination_account_id, d.destination_muxed_id) = destination(into);
        }
        OperationBody::ManageData(op) => {
            d.data_name = Some(text(&op.data_name));
            d.data_value = op
                .data_value
                .as_ref()
                .map(|value| base64::engine::general_purpose::STANDARD.encode(value));
        }
        OperationBody::BumpSequence(op) => {
            d.bump_to = Some(op.bump_to);
        }
        OperationBody::Inflation => {}
    }
    d
}

fn claims(offers: &[crate::xdr::ClaimOfferAtom]) -> Option<Vec<ClaimDoc>> {
    Some(offers.iter().map(ClaimDoc::from).collect())
}

fn outcome(result: &OperationResult) -> OperationOutcome {
    let mut o = OperationOutcome {
        succeeded: result.is_success(),
        result_code: Some(result.code()),
        ..OperationOutcome::default()
    };
    let Some(tr) = result.inner() else {
        return o;
    };
    o.inner_result_code = Some(tr.code());

    match tr {
        OperationResultTr::PathPaymentStrictReceive(r) | OperationResultTr::PathPaymentStrictSend(r) => match r {
            PathPaymentResult::Success { offers, last } => {
                o.result_offers = claims(offers);
                o.result_last_destination = Some(last.destination.to_string());
                o.result_last_amount = Some(amount(last.amount));
                o.result_last_asset = asset(&last.asset);
            }
            PathPaymentResult::NoIssuer(missing) => {
                o.result_no_issuer = asset(missing);
            }
            PathPaymentResult::Failure(_) => {}
        },
        OperationResultTr::ManageSellOffer(r)
        | OperationResultTr::CreatePassiveSellOffer(r)
        | OperationResultTr::ManageBuyOffer(r) => {
            if let ManageOfferResult::Success(success) = r {
                o.result_offers = claims(&success.offers_claimed);
                let (effect, offer) = match &success.offer {
                    ManageOfferEffect::Created(offer) => ("created", Some(OfferDoc::from(offer))),
                    ManageOfferEffect::Updated(offer) => ("updated", Some(OfferDoc::from(offer))),
                    ManageOfferEffect::Deleted => ("deleted", None),
                };
                o.result_offer_effect = Some(effect);
                o.result_offer = offer;
            }
        }
        OperationResultTr::AccountMerge(AccountMergeResult::Success(balance)) => {
            o.result_source_account_balance = Some(amount(*balance));
        }
        OperationResultTr::Inflation(InflationResult::Success(payouts)) => {
            o.result_inflation_payouts = Some(
                payouts
                    .iter()
                    .map(|payout| PayoutDoc {
                        account_id: payout.destination.to_string(),
                        amount: amount(payout.amount),
                    })
                    .collect(),
            );
        }
        OperationResultTr::AccountMerge(AccountMergeResult::Failure(_))
        | OperationResultTr::Inflation(InflationResult::Failure(_))
        | OperationResultTr::CreateAccount(_)
        | OperationResultTr::Payment(_)
        | OperationResultTr::SetOptions(_)
        | OperationResultTr::ChangeTrust(_)
        | OperationResultTr::AllowTrust(_)
        | OperationResultTr::ManageData(_)
        | OperationResultTr::BumpSequence(_) => {}
    }
    o
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionRow;
    use crate::processors::fixtures::*;
    use crate::xdr::*;
    use chrono::DateTime;

    fn tx_doc(ops: Vec<Operation>) -> TransactionDoc {
        let row = TransactionRow {
            hash: [7u8; 32],
            ledger_seq: 30,
            index: 2,
            envelope: envelope(ALICE, ops),
            result: success(Vec::new()),
            meta: TransactionMeta::V0(Vec::new()),
        };
        TransactionDoc::new(&row, 2, DateTime::default())
    }

    #[test]
    fn test_common_fields_and_source_fallback() {
        let op = operation(None, payment(BOB, 25_000_000));
        let tx = tx_doc(vec![op.clone()]);
        let doc = OperationFactory::produce(&tx, &op, None, 0).unwrap();

        assert_eq!(doc.paging_token, PagingToken::operation(30, 2, 1));
        assert_eq!(doc.index, 1);
        assert_eq!(doc.source_account, AccountId(ALICE).to_string());
        assert_eq!(doc.tx_source_account, doc.source_account);
        assert_eq!(doc.kind, OperationType::Payment);
        assert_eq!(doc.details.amount, Some(amount(25_000_000)));
        assert_eq!(doc.details.destination_account_id, Some(AccountId(BOB).to_string()));
        assert_eq!(doc.memo.as_ref().map(|m| m.value.as_str()), Some("fixture"));

        // no result: outcome stays at its zero value
        assert_eq!(doc.outcome, OperationOutcome::default());

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "payment");
        assert_eq!(json["amount"], "2.5000000");
        assert_eq!(json["succeeded"], false);
        assert!(json.get("offer_id").is_none());
    }

    #[test]
    fn test_own_source_account_wins() {
        let op = operation(Some(BOB), OperationBody::BumpSequence(BumpSequenceOp { bump_to: 99 }));
        let tx = tx_doc(vec![op.clone()]);
        let doc = OperationFactory::produce(&tx, &op, None, 3).unwrap();
        assert_eq!(doc.source_account, AccountId(BOB).to_string());
        assert_eq!(doc.index, 4);
        assert_eq!(doc.details.bump_to, Some(99));
    }

    #[test]
    fn test_path_payment_with_result() {
        let op = operation(
            None,
            OperationBody::PathPaymentStrictReceive(PathPaymentStrictReceiveOp {
                send_asset: Asset::Native,
                send_max: 1_000,
                destination: MuxedAccount {
                    ed25519: BOB,
                    id: Some(12),
                },
                dest_asset: usd(),
                dest_amount: 500,
                path: vec![usd(), Asset::Native],
            }),
        );
        let result = OperationResult::Inner(OperationResultTr::PathPaymentStrictReceive(PathPaymentResult::Success {
            offers: vec![claim(BOB, 4, 500, 900)],
            last: SimplePaymentResult {
                destination: AccountId(BOB),
                asset: usd(),
                amount: 500,
            },
        }));
        let tx = tx_doc(vec![op.clone()]);
        let doc = OperationFactory::produce(&tx, &op, Some(&result), 0).unwrap();

        assert_eq!(doc.details.path.as_ref().map(Vec::len), Some(2));
        assert_eq!(doc.details.source_max, Some(amount(1_000)));
        assert_eq!(doc.details.destination_muxed_id, Some(12));
        assert!(doc.outcome.succeeded);
        assert_eq!(doc.outcome.result_code, Some(0));
        assert_eq!(doc.outcome.inner_result_code, Some(0));
        assert_eq!(doc.outcome.result_last_amount, Some(amount(500)));
        assert_eq!(doc.outcome.result_offers.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_failure_results() {
        let op = operation(
            None,
            OperationBody::PathPaymentStrictSend(PathPaymentStrictSendOp {
                send_asset: Asset::Native,
                send_amount: 10,
                destination: MuxedAccount::from(AccountId(BOB)),
                dest_asset: usd(),
                dest_min: 1,
                path: Vec::new(),
            }),
        );
        let tx = tx_doc(vec![op.clone()]);

        let no_issuer = OperationResult::Inner(OperationResultTr::PathPaymentStrictSend(PathPaymentResult::NoIssuer(
            usd(),
        )));
        let doc = OperationFactory::produce(&tx, &op, Some(&no_issuer), 0).unwrap();
        assert!(!doc.outcome.succeeded);
        assert_eq!(doc.outcome.inner_result_code, Some(PATH_PAYMENT_NO_ISSUER));
        assert_eq!(doc.outcome.result_no_issuer.as_ref().map(|a| a.code.as_str()), Some("USD"));

        let doc = OperationFactory::produce(&tx, &op, Some(&OperationResult::NoAccount), 0).unwrap();
        assert!(!doc.outcome.succeeded);
        assert_eq!(doc.outcome.result_code, Some(-2));
        assert_eq!(doc.outcome.inner_result_code, None);
    }

    #[test]
    fn test_set_options_signer_and_merge() {
        let op = operation(
            None,
            OperationBody::SetOptions(SetOptionsOp {
                home_domain: Some(b"example.com".to_vec()),
                signer: Some(Signer {
                    key: SignerKey::Ed25519(BOB),
                    weight: 5,
                }),
                ..SetOptionsOp::default()
            }),
        );
        let tx = tx_doc(vec![op.clone()]);
        let doc = OperationFactory::produce(&tx, &op, None, 0).unwrap();
        assert_eq!(doc.details.home_domain.as_deref(), Some("example.com"));
        assert_eq!(doc.details.signer_key, Some(AccountId(BOB).to_string()));
        assert_eq!(doc.details.signer_type, Some("ed25519"));
        assert_eq!(doc.details.signer_weight, Some(5));

        let merge = operation(None, OperationBody::AccountMerge(MuxedAccount::from(AccountId(BOB))));
        let result = OperationResult::Inner(OperationResultTr::AccountMerge(AccountMergeResult::Success(70)));
        let doc = OperationFactory::produce(&tx, &merge, Some(&result), 1).unwrap();
        assert_eq!(doc.outcome.result_source_account_balance, Some(amount(70)));
    }

    #[test]
    fn test_manage_offer_effect() {
        let op = operation(
            None,
            OperationBody::ManageSellOffer(ManageSellOfferOp {
                selling: Asset::Native,
                buying: usd(),
                amount: 100,
                price: Price { n: 3, d: 2 },
                offer_id: 0,
            }),
        );
        let result = OperationResult::Inner(OperationResultTr::ManageSellOffer(ManageOfferResult::Success(
            ManageOfferSuccessResult {
                offers_claimed: Vec::new(),
                offer: ManageOfferEffect::Created(offer_entry(ALICE, 11, 100)),
            },
        )));
        let tx = tx_doc(vec![op.clone()]);
        let doc = OperationFactory::produce(&tx, &op, Some(&result), 0).unwrap();
        assert_eq!(doc.details.price, Some(1.5));
        assert_eq!(doc.outcome.result_offer_effect, Some("created"));
        assert_eq!(doc.outcome.result_offer.as_ref().map(|o| o.offer_id), Some(11));
    }

    #[test]
    fn test_operation_order_overflow() {
        let op = operation(None, OperationBody::Inflation);
        let tx = tx_doc(vec![op.clone()]);
        assert!(OperationFactory::produce(&tx, &op, None, 254).is_ok());
        assert!(OperationFactory::produce(&tx, &op, None, 255).is_err());
    }
}
