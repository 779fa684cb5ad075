//! In-memory source database and document index for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use ledger_indexer::core::{BulkOutcome, DocumentIndex, IndexError, IndexName, IndexerResult, LedgerSource, RangeCount, SeqGap};
use ledger_indexer::models::{FeeRow, LedgerRow, TransactionRow};
use ledger_indexer::xdr::*;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

pub const ALICE: [u8; 32] = [1u8; 32];
pub const BOB: [u8; 32] = [2u8; 32];

// ---------------------------------------------------------------------------
// Typed rows

pub fn ledger_row(seq: u32) -> LedgerRow {
    let mut hash = [0u8; 32];
    hash[..4].copy_from_slice(&seq.to_be_bytes());
    let header = LedgerHeader {
        ledger_version: 15,
        previous_ledger_hash: [0; 32],
        scp_value: StellarValue {
            tx_set_hash: [0; 32],
            close_time: 1_600_000_000 + u64::from(seq) * 5,
            upgrades: Vec::new(),
            signature: None,
        },
        tx_set_result_hash: [0; 32],
        bucket_list_hash: [0; 32],
        ledger_seq: seq,
        total_coins: 1_000_000_000_000,
        fee_pool: 0,
        inflation_seq: 0,
        id_pool: 0,
        base_fee: 100,
        base_reserve: 5_000_000,
        max_tx_set_size: 1_000,
        skip_list: [[0; 32]; 4],
        flags: None,
    };
    LedgerRow::new(hash, header).expect("valid close time")
}

fn account(key: [u8; 32], balance: i64) -> LedgerEntry {
    LedgerEntry {
        last_modified_ledger_seq: 1,
        data: LedgerEntryData::Account(AccountEntry {
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
        }),
        sponsor: None,
    }
}

fn tx_hash(seq: u32, index: u32) -> Hash {
    let mut hash = [0xffu8; 32];
    hash[..4].copy_from_slice(&seq.to_be_bytes());
    hash[4..8].copy_from_slice(&index.to_be_bytes());
    hash
}

/// ALICE pays BOB 1 XLM
pub fn payment_tx(seq: u32, index: u32) -> TransactionRow {
    let tx = Transaction {
        source_account: MuxedAccount { ed25519: ALICE, id: None },
        fee: 100,
        seq_num: i64::from(seq),
        time_bounds: None,
        memo: Memo::Id(u64::from(index)),
        operations: vec![Operation {
            source_account: None,
            body: OperationBody::Payment(PaymentOp {
                destination: MuxedAccount { ed25519: BOB, id: None },
                asset: Asset::Native,
                amount: 10_000_000,
            }),
        }],
    };
    TransactionRow {
        hash: tx_hash(seq, index),
        ledger_seq: seq,
        index,
        envelope: TransactionEnvelope::Tx {
            tx,
            signatures: Vec::new(),
        },
        result: TransactionResult {
            fee_charged: 100,
            result: TransactionResultResult::Success(vec![OperationResult::Inner(OperationResultTr::Payment(0))]),
        },
        meta: TransactionMeta::V1 {
            tx_changes: Vec::new(),
            operations: vec![OperationMeta {
                changes: vec![
                    LedgerEntryChange::State(account(ALICE, 50_000_000)),
                    LedgerEntryChange::Updated(account(ALICE, 40_000_000)),
                    LedgerEntryChange::State(account(BOB, 10_000_000)),
                    LedgerEntryChange::Updated(account(BOB, 20_000_000)),
                ],
            }],
        },
    }
}

pub fn fee_row(seq: u32, index: u32) -> FeeRow {
    FeeRow {
        hash: tx_hash(seq, index),
        ledger_seq: seq,
        index,
        changes: vec![
            LedgerEntryChange::State(account(ALICE, 50_000_100)),
            LedgerEntryChange::Updated(account(ALICE, 50_000_000)),
        ],
    }
}

// ---------------------------------------------------------------------------
// Source database

#[derive(Default)]
pub struct MemorySource {
    ledgers: BTreeMap<u32, LedgerRow>,
    txs: BTreeMap<u32, Vec<TransactionRow>>,
    fees: BTreeMap<u32, Vec<FeeRow>>,
}

impl MemorySource {
    /// Every ledger holds one payment
    pub fn with_ledgers(seqs: impl IntoIterator<Item = u32>) -> Self {
        let mut source = Self::default();
        for seq in seqs {
            source.ledgers.insert(seq, ledger_row(seq));
            source.txs.insert(seq, vec![payment_tx(seq, 1)]);
            source.fees.insert(seq, vec![fee_row(seq, 1)]);
        }
        source
    }

    /// Replace ledger `seq` with one holding `txs` payments
    pub fn with_busy_ledger(mut self, seq: u32, txs: u32) -> Self {
        self.ledgers.insert(seq, ledger_row(seq));
        self.txs.insert(seq, (1..=txs).map(|index| payment_tx(seq, index)).collect());
        self.fees.insert(seq, (1..=txs).map(|index| fee_row(seq, index)).collect());
        self
    }

    fn rows<R: Clone>(map: &BTreeMap<u32, Vec<R>>, seqs: &[u32]) -> Vec<R> {
        let wanted: BTreeSet<u32> = seqs.iter().copied().collect();
        wanted
            .iter()
            .filter_map(|seq| map.get(seq))
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerSource for MemorySource {
    async fn ledgers_in_range(&self, start: u32, count: u32) -> IndexerResult<Vec<LedgerRow>> {
        let end = u64::from(start) + u64::from(count);
        Ok(self
            .ledgers
            .range(start..)
            .take_while(|(seq, _)| u64::from(**seq) < end)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn ledgers_by_seq(&self, seqs: &[u32]) -> IndexerResult<Vec<LedgerRow>> {
        let wanted: BTreeSet<u32> = seqs.iter().copied().collect();
        Ok(wanted.iter().filter_map(|seq| self.ledgers.get(seq)).cloned().collect())
    }

    async fn next_ledger_after(&self, seq: u32) -> IndexerResult<Option<LedgerRow>> {
        Ok(self
            .ledgers
            .range(seq.saturating_add(1)..)
            .next()
            .filter(|(next, _)| **next > seq)
            .map(|(_, row)| row.clone()))
    }

    async fn transactions_for(&self, seqs: &[u32]) -> IndexerResult<Vec<TransactionRow>> {
        Ok(Self::rows(&self.txs, seqs))
    }

    async fn fee_changes_for(&self, seqs: &[u32]) -> IndexerResult<Vec<FeeRow>> {
        Ok(Self::rows(&self.fees, seqs))
    }

    async fn first_ledger_seq(&self) -> IndexerResult<Option<u32>> {
        Ok(self.ledgers.keys().next().copied())
    }

    async fn last_ledger_seq(&self) -> IndexerResult<Option<u32>> {
        Ok(self.ledgers.keys().next_back().copied())
    }

    async fn ledger_gaps(&self) -> IndexerResult<Vec<SeqGap>> {
        let seqs: Vec<u32> = self.ledgers.keys().copied().collect();
        Ok(seqs
            .windows(2)
            .filter(|pair| pair[1] - pair[0] > 1)
            .map(|pair| SeqGap {
                start: pair[0] + 1,
                end: pair[1] - 1,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Document index

/// Stores documents by index and id, so rewriting a document replaces it
#[derive(Default)]
pub struct MemoryIndex {
    docs: Mutex<BTreeMap<(String, String), Value>>,
    ledger_seqs: Mutex<BTreeSet<u32>>,
    /// Upcoming bulk requests that fail with a transport error
    failures: Mutex<usize>,
    /// Reject every bulk request
    down: Mutex<bool>,
    bulk_calls: Mutex<usize>,
    created: Mutex<Vec<IndexName>>,
    deleted: Mutex<Vec<IndexName>>,
}

impl MemoryIndex {
    pub fn with_ledgers(seqs: impl IntoIterator<Item = u32>) -> Self {
        let index = Self::default();
        index.ledger_seqs.lock().unwrap().extend(seqs);
        index
    }

    pub fn ledger_seqs(&self) -> Vec<u32> {
        self.ledger_seqs.lock().unwrap().iter().copied().collect()
    }

    pub fn holds(&self, seq: u32) -> bool {
        self.ledger_seqs.lock().unwrap().contains(&seq)
    }

    pub fn documents_in(&self, index: &str) -> usize {
        self.docs.lock().unwrap().keys().filter(|(name, _)| name == index).count()
    }

    pub fn fail_next(&self, n: usize) {
        *self.failures.lock().unwrap() = n;
    }

    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }

    pub fn bulk_calls(&self) -> usize {
        *self.bulk_calls.lock().unwrap()
    }

    pub fn created(&self) -> Vec<IndexName> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<IndexName> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentIndex for MemoryIndex {
    async fn bulk(&self, body: Bytes) -> IndexerResult<BulkOutcome> {
        *self.bulk_calls.lock().unwrap() += 1;
        {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(IndexError::Transport("connection refused".to_string()).into());
            }
        }

        let lines: Vec<Value> = body
            .split(|b| *b == b'\n')
            .filter(|line| !line.is_empty())
            .map(serde_json::from_slice)
            .collect::<Result<_, _>>()?;
        let items = lines.len() / 2;

        if *self.down.lock().unwrap() {
            return Ok(BulkOutcome {
                errors: true,
                items,
                failed_items: items,
                first_error: Some("status 503: unavailable".to_string()),
            });
        }

        let mut docs = self.docs.lock().unwrap();
        let mut ledger_seqs = self.ledger_seqs.lock().unwrap();
        for (position, pair) in lines.chunks(2).enumerate() {
            let action = &pair[0]["index"];
            let name = action["_index"].as_str().unwrap_or_default().to_string();
            let id = action["_id"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("auto-{}-{}", docs.len(), position));
            if name.ends_with("ledger") {
                if let Some(seq) = pair[1]["seq"].as_u64() {
                    ledger_seqs.insert(seq as u32);
                }
            }
            docs.insert((name, id), pair[1].clone());
        }

        Ok(BulkOutcome {
            errors: false,
            items,
            failed_items: 0,
            first_error: None,
        })
    }

    async fn ledger_seq_bounds(&self) -> IndexerResult<Option<(u32, u32)>> {
        let seqs = self.ledger_seqs.lock().unwrap();
        Ok(seqs.iter().next().copied().zip(seqs.iter().next_back().copied()))
    }

    async fn ledger_seqs_in(&self, lo: u32, hi: u32) -> IndexerResult<Vec<u32>> {
        Ok(self.ledger_seqs.lock().unwrap().range(lo..hi).copied().collect())
    }

    async fn count(&self, index: IndexName) -> IndexerResult<u64> {
        if index == IndexName::Ledger {
            return Ok(self.ledger_seqs.lock().unwrap().len() as u64);
        }
        Ok(self.documents_in(index.as_str()) as u64)
    }

    async fn ledger_counts_by_range(&self, start: u32, end: u32, interval: u32) -> IndexerResult<Vec<RangeCount>> {
        let seqs = self.ledger_seqs.lock().unwrap();
        let mut out = Vec::new();
        let mut from = start;
        while from < end {
            let to = from.saturating_add(interval).min(end);
            out.push(RangeCount {
                start: from,
                end: to,
                count: seqs.range(from..to).count() as u64,
            });
            from = to;
        }
        Ok(out)
    }

    async fn create_index(&self, index: IndexName, _body: &Value) -> IndexerResult<()> {
        self.created.lock().unwrap().push(index);
        Ok(())
    }

    async fn delete_index(&self, index: IndexName) -> IndexerResult<()> {
        self.deleted.lock().unwrap().push(index);
        Ok(())
    }
}
