//! Document producers
//!
//! The extractors walk change logs and operation results, the factory turns
//! one operation into its document, and the ledger serializer drives all of
//! them in paging-token order for one ledger.

mod balance;
mod ledger;
mod offer;
mod operation;
mod trade;

pub use balance::BalanceExtractor;
pub use ledger::{LedgerSerializer, SerializeStats};
pub use offer::OfferExtractor;
pub use operation::OperationFactory;
pub use trade::{trade_price, TradeExtractor};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Typed ledger records for processor tests

    use crate::xdr::*;

    pub const ALICE: [u8; 32] = [1u8; 32];
    pub const BOB: [u8; 32] = [2u8; 32];
    pub const ISSUER: [u8; 32] = [3u8; 32];

    pub fn usd() -> Asset {
        Asset::CreditAlphanum4 {
            code: *b"USD\0",
            issuer: AccountId(ISSUER),
        }
    }

    fn entry(data: LedgerEntryData) -> LedgerEntry {
        LedgerEntry {
            last_modified_ledger_seq: 1,
            data,
            sponsor: None,
        }
    }

    pub fn account(key: [u8; 32], balance: i64) -> LedgerEntry {
        entry(LedgerEntryData::Account(AccountEntry {
            account_id: AccountId(key),
            balance,
            seq_num: 1,
            num_sub_entries: 0,
            inflation_dest: None,
            flags: 0,
            home_domain: Vec::new(),
            thresholds: [1, 0, 0, 0],
            signers: Vec::new(),
            liabilities: None,
        }))
    }

    pub fn trustline(key: [u8; 32], asset: Asset, balance: i64) -> LedgerEntry {
        entry(LedgerEntryData::Trustline(TrustLineEntry {
            account_id: AccountId(key),
            asset,
            balance,
            limit: i64::MAX,
            flags: 1,
            liabilities: None,
        }))
    }

    pub fn offer_entry(seller: [u8; 32], offer_id: i64, amount: i64) -> OfferEntry {
        OfferEntry {
            seller_id: AccountId(seller),
            offer_id,
            selling: Asset::Native,
            buying: usd(),
            amount,
            price: Price { n: 1, d: 2 },
            flags: 0,
        }
    }

    pub fn offer(seller: [u8; 32], offer_id: i64, amount: i64) -> LedgerEntry {
        entry(LedgerEntryData::Offer(offer_entry(seller, offer_id, amount)))
    }

    pub fn operation(source: Option<[u8; 32]>, body: OperationBody) -> Operation {
        Operation {
            source_account: source.map(|key| MuxedAccount::from(AccountId(key))),
            body,
        }
    }

    pub fn payment(to: [u8; 32], amount: i64) -> OperationBody {
        OperationBody::Payment(PaymentOp {
            destination: MuxedAccount::from(AccountId(to)),
            asset: Asset::Native,
            amount,
        })
    }

    pub fn envelope(source: [u8; 32], operations: Vec<Operation>) -> TransactionEnvelope {
        TransactionEnvelope::Tx {
            tx: Transaction {
                source_account: MuxedAccount::from(AccountId(source)),
                fee: 100 * operations.len() as u32,
                seq_num: 7,
                time_bounds: None,
                memo: Memo::Text(b"fixture".to_vec()),
                operations,
            },
            signatures: Vec::new(),
        }
    }

    pub fn claim(seller: [u8; 32], offer_id: i64, sold: i64, bought: i64) -> ClaimOfferAtom {
        ClaimOfferAtom {
            seller_id: AccountId(seller),
            offer_id,
            asset_sold: usd(),
            amount_sold: sold,
            asset_bought: Asset::Native,
            amount_bought: bought,
        }
    }

    pub fn success(results: Vec<OperationResult>) -> TransactionResult {
        TransactionResult {
            fee_charged: 100,
            result: TransactionResultResult::Success(results),
        }
    }

    pub fn failed(results: Vec<OperationResult>) -> TransactionResult {
        TransactionResult {
            fee_charged: 100,
            result: TransactionResultResult::Failed(results),
        }
    }
}
