//! Balance change extraction

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::core::error::IndexerResult;
use crate::core::types::{EffectCounter, PagingToken};
use crate::models::{amount, AssetDoc, BalanceDoc, BalanceSource};
use crate::xdr::{AccountId, Asset, LedgerEntry, LedgerEntryChange, LedgerEntryData};

/// Turns one change set (a fee change set or one operation's changes) into
/// balance documents.
pub struct BalanceExtractor {
    base: PagingToken,
    source: BalanceSource,
    close_time: DateTime<Utc>,
}

impl BalanceExtractor {
    pub fn new(base: PagingToken, source: BalanceSource, close_time: DateTime<Utc>) -> Self {
        Self {
            base,
            source,
            close_time,
        }
    }

    pub fn extract(&self, changes: &[LedgerEntryChange]) -> IndexerResult<Vec<BalanceDoc>> {
        let mut previous: HashMap<(AccountId, Asset), i64> = HashMap::new();
        let mut counter = EffectCounter::new();
        let mut docs = Vec::new();

        for change in changes {
            match change {
                LedgerEntryChange::State(entry) => {
                    if let Some((account, asset, balance)) = balance_of(entry) {
                        previous.insert((account, asset), balance);
                    }
                }
                LedgerEntryChange::Created(entry) => {
                    if let Some((account, asset, balance)) = balance_of(entry) {
                        docs.push(self.doc(&mut counter, account, &asset, balance, balance)?);
                        previous.insert((account, asset), balance);
                    }
                }
                LedgerEntryChange::Updated(entry) => {
                    if let Some((account, asset, balance)) = balance_of(entry) {
                        // No prior state in this change set means a zero baseline
                        let before = previous.get(&(account, asset.clone())).copied().unwrap_or(0);
                        let diff = balance - before;
                        if diff != 0 {
                            docs.push(self.doc(&mut counter, account, &asset, balance, diff)?);
                        }
                        previous.insert((account, asset), balance);
                    }
                }
                LedgerEntryChange::Removed(_) => {}
            }
        }

        Ok(docs)
    }

    fn doc(
        &self,
        counter: &mut EffectCounter,
        account: AccountId,
        asset: &Asset,
        balance: i64,
        diff: i64,
    ) -> IndexerResult<BalanceDoc> {
        Ok(BalanceDoc {
            paging_token: PagingToken::effect_index(counter.next()?).merge(&self.base),
            account_id: account.to_string(),
            balance: amount(balance),
            diff: amount(diff),
            asset: AssetDoc::from(asset),
            source: self.source,
            created_at: self.close_time,
        })
    }
}

/// Balance carried by an entry, for the entry kinds that hold one
fn balance_of(entry: &LedgerEntry) -> Option<(AccountId, Asset, i64)> {
    match &entry.data {
        LedgerEntryData::Account(account) => Some((account.account_id, Asset::Native, account.balance)),
        LedgerEntryData::Trustline(line) => Some((line.account_id, line.asset.clone(), line.balance)),
        LedgerEntryData::Offer(_) | LedgerEntryData::Data(_) => None,
    }
}
