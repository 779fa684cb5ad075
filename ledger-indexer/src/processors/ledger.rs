//! Ledger serializer
//!
//! Drives the extractors over one ledger and writes every document to a bulk
//! sink as soon as it is built. Documents come out in paging-token order:
//! the ledger, then per transaction its document, fee balances and offer
//! events, then per operation its document, balances, trades and signer
//! change.

use std::collections::HashMap;
use std::io::Write;

use crate::core::error::IndexerResult;
use crate::core::types::{order_from_position, EffectGroup, PagingToken};
use crate::models::{
    BalanceSource, BulkSink, FeeRow, LedgerDoc, LedgerRow, OperationDoc, SignerHistoryDoc, TransactionDoc,
    TransactionRow,
};
use crate::processors::{BalanceExtractor, OfferExtractor, OperationFactory, TradeExtractor};
use crate::xdr::{OperationBody, OperationMeta, OperationResult};

/// Document counts for one or more serialized ledgers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeStats {
    pub ledgers: usize,
    pub transactions: usize,
    pub operations: usize,
    pub balances: usize,
    pub trades: usize,
    pub offer_events: usize,
    pub signers: usize,
}

impl SerializeStats {
    pub fn documents(&self) -> usize {
        self.ledgers
            + self.transactions
            + self.operations
            + self.balances
            + self.trades
            + self.offer_events
            + self.signers
    }

    pub fn add(&mut self, other: &SerializeStats) {
        self.ledgers += other.ledgers;
        self.transactions += other.transactions;
        self.operations += other.operations;
        self.balances += other.balances;
        self.trades += other.trades;
        self.offer_events += other.offer_events;
        self.signers += other.signers;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerSerializer;

impl LedgerSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize one ledger. `txs` and `fees` must belong to `ledger` and be
    /// in apply order.
    pub fn serialize<W: Write>(
        &self,
        ledger: &LedgerRow,
        txs: &[TransactionRow],
        fees: &[FeeRow],
        sink: &mut BulkSink<W>,
    ) -> IndexerResult<SerializeStats> {
        let mut stats = SerializeStats::default();
        let fees: HashMap<u32, &FeeRow> = fees.iter().map(|fee| (fee.index, fee)).collect();

        sink.push(&LedgerDoc::new(ledger, txs))?;
        stats.ledgers += 1;

        for (position, row) in txs.iter().enumerate() {
            let order = order_from_position("transaction_order", position)?;
            let tx = TransactionDoc::new(row, order, ledger.close_time);
            sink.push(&tx)?;
            stats.transactions += 1;

            let success = row.is_success();
            if success {
                if let Some(fee) = fees.get(&row.index) {
                    let base = PagingToken::effect_group(EffectGroup::Fee).merge(&tx.paging_token);
                    let docs = BalanceExtractor::new(base, BalanceSource::Fee, ledger.close_time).extract(&fee.changes)?;
                    sink.push_all(&docs)?;
                    stats.balances += docs.len();
                }

                let base = PagingToken::effect_group(EffectGroup::Offer).merge(&tx.paging_token);
                let events = OfferExtractor::new(base, tx.seq, ledger.close_time).extract(row.meta.operations())?;
                sink.push_all(&events)?;
                stats.offer_events += events.len();
            }

            let results = row.result.operation_results();
            let metas = row.meta.operations();
            for (i, op) in row.envelope.operations().iter().enumerate() {
                let result = if success { results.get(i) } else { None };
                let doc = OperationFactory::produce(&tx, op, result, i)?;
                sink.push(&doc)?;
                stats.operations += 1;

                if success {
                    self.operation_effects(&doc, &op.body, metas.get(i), result, sink, &mut stats)?;
                }
            }
        }

        Ok(stats)
    }

    fn operation_effects<W: Write>(
        &self,
        doc: &OperationDoc,
        body: &OperationBody,
        meta: Option<&OperationMeta>,
        result: Option<&OperationResult>,
        sink: &mut BulkSink<W>,
        stats: &mut SerializeStats,
    ) -> IndexerResult<()> {
        if let Some(meta) = meta {
            let base = PagingToken::effect_group(EffectGroup::Balance).merge(&doc.paging_token);
            let docs = BalanceExtractor::new(base, BalanceSource::Meta, doc.close_time).extract(&meta.changes)?;
            sink.push_all(&docs)?;
            stats.balances += docs.len();
        }

        if let Some(result) = result {
            let trades = TradeExtractor::extract(doc, result)?;
            sink.push_all(&trades)?;
            stats.trades += trades.len();
        }

        if let OperationBody::SetOptions(options) = body {
            if let Some(signer) = &options.signer {
                let paging_token = PagingToken::effect_index(1)
                    .merge(&PagingToken::effect_group(EffectGroup::Signer))
                    .merge(&doc.paging_token);
                sink.push(&SignerHistoryDoc {
                    paging_token,
                    account_id: doc.source_account.clone(),
                    signer: signer.key.to_string(),
                    signer_type: signer.key.type_name(),
                    weight: signer.weight,
                    seq: doc.seq,
                    tx_index: doc.tx_index,
                    op_index: doc.index,
                    created_at: doc.close_time,
                })?;
                stats.signers += 1;
            }
        }

        Ok(())
    }
}
