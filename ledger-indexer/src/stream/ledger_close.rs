//! Ledger close records from a meta stream
//!
//! A frame holds one `LedgerCloseMeta`. Only the header, the transaction set
//! and the per transaction processing are decoded; upgrade and consensus
//! data that follow are left unread.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::core::error::{DecodeError, IndexerResult};
use crate::models::{FeeRow, LedgerRow, TransactionRow};
use crate::xdr::{
    Hash, LedgerHeaderHistoryEntry, ReadXdr, SignaturePayload, TransactionEnvelope, TransactionResultMeta,
    TransactionSet, XdrReader, UNBOUNDED,
};

const ENVELOPE_TYPE_TX_V0: i32 = 0;
const ENVELOPE_TYPE_TX: i32 = 2;

/// Network id a transaction hash is bound to
pub fn network_id(passphrase: &str) -> Hash {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Hash of a signed transaction on the given network
fn transaction_hash(network: &Hash, payload: &SignaturePayload<'_>) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(network);
    if payload.envelope_type == ENVELOPE_TYPE_TX_V0 {
        // v0 transactions hash as v1 with an ed25519 source tag
        hasher.update(ENVELOPE_TYPE_TX.to_be_bytes());
        hasher.update([0u8; 4]);
    } else {
        hasher.update(payload.envelope_type.to_be_bytes());
    }
    hasher.update(payload.tx_bytes);
    hasher.finalize().into()
}

/// One closed ledger as the serializer consumes it
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerCloseRecord {
    pub ledger: LedgerRow,
    pub transactions: Vec<TransactionRow>,
    pub fees: Vec<FeeRow>,
}

impl LedgerCloseRecord {
    pub fn sequence(&self) -> u32 {
        self.ledger.sequence()
    }
}

/// Decodes ledger close frames for one network
#[derive(Debug, Clone)]
pub struct LedgerCloseDecoder {
    network: Hash,
}

impl LedgerCloseDecoder {
    pub fn new(passphrase: &str) -> Self {
        Self {
            network: network_id(passphrase),
        }
    }

    pub fn decode(&self, frame: &[u8]) -> IndexerResult<LedgerCloseRecord> {
        let mut r = XdrReader::new(frame);
        match r.read_i32()? {
            0 => {}
            value => {
                return Err(DecodeError::UnknownDiscriminant {
                    kind: "LedgerCloseMeta",
                    value,
                }
                .into())
            }
        }

        let entry = LedgerHeaderHistoryEntry::read_xdr(&mut r)?;
        let (tx_set, hashes) = self.read_tx_set(&mut r)?;
        let processing: Vec<TransactionResultMeta> = r.read_array("txProcessing", UNBOUNDED)?;

        let mut envelopes: HashMap<Hash, TransactionEnvelope> = hashes.into_iter().zip(tx_set.txs).collect();
        let ledger_seq = entry.header.ledger_seq;
        let mut transactions = Vec::with_capacity(processing.len());
        let mut fees = Vec::with_capacity(processing.len());

        for (position, meta) in processing.into_iter().enumerate() {
            let hash = meta.result.transaction_hash;
            let envelope = envelopes.remove(&hash).ok_or_else(|| {
                DecodeError::Invalid(format!(
                    "ledger {} result {} has no envelope in the transaction set",
                    ledger_seq,
                    hex::encode(hash)
                ))
            })?;
            let index = position as u32 + 1;
            fees.push(FeeRow {
                hash,
                ledger_seq,
                index,
                changes: meta.fee_processing,
            });
            transactions.push(TransactionRow {
                hash,
                ledger_seq,
                index,
                envelope,
                result: meta.result.result,
                meta: meta.tx_apply_processing,
            });
        }

        Ok(LedgerCloseRecord {
            ledger: LedgerRow::new(entry.hash, entry.header)?,
            transactions,
            fees,
        })
    }

    fn read_tx_set(&self, r: &mut XdrReader<'_>) -> Result<(TransactionSet, Vec<Hash>), DecodeError> {
        let previous_ledger_hash = r.read_fixed::<32>()?;
        let count = r.read_u32()? as usize;
        if count > r.remaining() {
            return Err(DecodeError::LengthExceeded {
                kind: "txs",
                len: count,
                max: r.remaining(),
            });
        }
        let mut txs = Vec::with_capacity(count);
        let mut hashes = Vec::with_capacity(count);
        for _ in 0..count {
            let (envelope, payload) = TransactionEnvelope::read_with_payload(r)?;
            hashes.push(transaction_hash(&self.network, &payload));
            txs.push(envelope);
        }
        Ok((
            TransactionSet {
                previous_ledger_hash,
                txs,
            },
            hashes,
        ))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Ledger close frames for tests

    use super::*;
    use crate::xdr::testing::XdrWriter;

    pub const PASSPHRASE: &str = "Test SDF Network ; September 2015";
    pub const ALICE: [u8; 32] = [1u8; 32];

    fn header(w: &mut XdrWriter, seq: u32) {
        w.fixed(&[0xaa; 32]) // ledger hash
            .u32(15) // version
            .fixed(&[0xbb; 32]) // previous ledger
            .fixed(&[0xcc; 32]) // tx set hash
            .u64(1_600_000_000) // close time
            .u32(0) // upgrades
            .i32(0) // basic stellar value
            .fixed(&[0; 32])
            .fixed(&[0; 32])
            .u32(seq)
            .i64(1_000)
            .i64(10)
            .u32(0)
            .u64(0)
            .u32(100)
            .u32(5_000_000)
            .u32(1_000);
        for _ in 0..4 {
            w.fixed(&[0; 32]);
        }
        w.i32(0).i32(0); // header ext, history entry ext
    }

    /// Body of a v1 transaction bumping ALICE's sequence
    pub fn bump_tx(seq_num: i64) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.i32(0)
            .fixed(&ALICE)
            .u32(100)
            .i64(seq_num)
            .u32(0) // no time bounds
            .i32(0) // no memo
            .u32(1)
            .u32(0) // no op source
            .i32(11) // bump sequence
            .i64(seq_num + 10)
            .i32(0); // ext
        w.into_bytes()
    }

    fn result_meta(w: &mut XdrWriter, hash: &Hash) {
        w.fixed(hash)
            .i64(100) // fee charged
            .i32(0) // txSUCCESS
            .u32(1)
            .i32(0)
            .i32(11)
            .i32(0)
            .i32(0); // result ext
        w.u32(1).i32(1).account_entry(ALICE, 900); // fee processing
        w.i32(2).u32(0).u32(1).u32(0).u32(0); // meta v2, one empty op
    }

    pub fn tx_hash(tx: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(network_id(PASSPHRASE));
        hasher.update(2i32.to_be_bytes());
        hasher.update(tx);
        hasher.finalize().into()
    }

    /// `LedgerCloseMeta` v0 for ledger `seq`; `results` are in apply order
    pub fn ledger_close(seq: u32, txs: &[Vec<u8>], results: &[Hash]) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.i32(0);
        header(&mut w, seq);
        w.fixed(&[0xbb; 32]).u32(txs.len() as u32);
        for tx in txs {
            w.i32(2).fixed(tx).u32(0);
        }
        w.u32(results.len() as u32);
        for hash in results {
            result_meta(&mut w, hash);
        }
        w.u32(0); // upgrades processing, left unread
        w.into_bytes()
    }

    /// One ledger with a single successful transaction
    pub fn simple_ledger_close(seq: u32) -> Vec<u8> {
        let tx = bump_tx(i64::from(seq));
        let hash = tx_hash(&tx);
        ledger_close(seq, &[tx], &[hash])
    }
}
