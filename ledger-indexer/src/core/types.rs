//! Core domain types

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::error::{IndexerError, IndexerResult};

const LEDGER_SHIFT: u32 = 32;
const TRANSACTION_SHIFT: u32 = 24;
const OPERATION_SHIFT: u32 = 16;
const EFFECT_GROUP_SHIFT: u32 = 8;

/// Composite position of a document in ledger history.
///
/// Packs (ledger, transaction, operation, effect group, effect index) into a
/// single `u64`, most significant first. The packed value is every derived
/// document's id and sort key, so the derived `Ord` (field order) agrees with
/// the ordering of the packed integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagingToken {
    pub ledger_seq: u32,
    pub transaction_order: u8,
    pub operation_order: u8,
    pub effect_group: u8,
    pub effect_index: u8,
}

impl PagingToken {
    pub fn ledger(ledger_seq: u32) -> Self {
        Self {
            ledger_seq,
            ..Self::default()
        }
    }

    pub fn transaction(ledger_seq: u32, transaction_order: u8) -> Self {
        Self {
            ledger_seq,
            transaction_order,
            ..Self::default()
        }
    }

    pub fn operation(ledger_seq: u32, transaction_order: u8, operation_order: u8) -> Self {
        Self {
            ledger_seq,
            transaction_order,
            operation_order,
            ..Self::default()
        }
    }

    /// Key carrying only an effect group, to be merged onto a base position
    pub fn effect_group(group: EffectGroup) -> Self {
        Self {
            effect_group: group as u8,
            ..Self::default()
        }
    }

    /// Key carrying only an effect index, to be merged onto a base position
    pub fn effect_index(effect_index: u8) -> Self {
        Self {
            effect_index,
            ..Self::default()
        }
    }

    pub fn pack(&self) -> u64 {
        (u64::from(self.ledger_seq) << LEDGER_SHIFT)
            | (u64::from(self.transaction_order) << TRANSACTION_SHIFT)
            | (u64::from(self.operation_order) << OPERATION_SHIFT)
            | (u64::from(self.effect_group) << EFFECT_GROUP_SHIFT)
            | u64::from(self.effect_index)
    }

    pub fn unpack(value: u64) -> Self {
        Self {
            ledger_seq: (value >> LEDGER_SHIFT) as u32,
            transaction_order: (value >> TRANSACTION_SHIFT) as u8,
            operation_order: (value >> OPERATION_SHIFT) as u8,
            effect_group: (value >> EFFECT_GROUP_SHIFT) as u8,
            effect_index: value as u8,
        }
    }

    /// Combine with `base`: each non-zero field of `self` wins, otherwise the
    /// base field is kept.
    pub fn merge(&self, base: &PagingToken) -> PagingToken {
        fn pick<T: Default + PartialEq + Copy>(own: T, base: T) -> T {
            if own != T::default() {
                own
            } else {
                base
            }
        }

        PagingToken {
            ledger_seq: pick(self.ledger_seq, base.ledger_seq),
            transaction_order: pick(self.transaction_order, base.transaction_order),
            operation_order: pick(self.operation_order, base.operation_order),
            effect_group: pick(self.effect_group, base.effect_group),
            effect_index: pick(self.effect_index, base.effect_index),
        }
    }
}

impl fmt::Display for PagingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pack())
    }
}

impl FromStr for PagingToken {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(PagingToken::unpack)
    }
}

impl Serialize for PagingToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PagingToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Effect groups partition the effects of one operation (or transaction)
/// so that different extractors never hand out the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EffectGroup {
    Fee = 1,
    Offer = 2,
    Balance = 3,
    Trade = 4,
    Signer = 5,
}

/// Convert a zero-based position into a one-based ordering field
pub fn order_from_position(field: &'static str, position: usize) -> IndexerResult<u8> {
    u8::try_from(position + 1).map_err(|_| IndexerError::OrderingOverflow {
        field,
        value: position + 1,
    })
}

/// Per-extractor counter handing out effect indices starting at 1
#[derive(Debug, Default)]
pub struct EffectCounter {
    last: u8,
}

impl EffectCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> IndexerResult<u8> {
        self.last = self
            .last
            .checked_add(1)
            .ok_or(IndexerError::OrderingOverflow {
                field: "effect_index",
                value: usize::from(self.last) + 1,
            })?;
        Ok(self.last)
    }
}

/// A contiguous run of ledger sequences `[start, end]` absent from a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqGap {
    pub start: u32,
    pub end: u32,
}

impl SeqGap {
    pub fn count(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// Physically separate indexes documents are written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexName {
    Ledger,
    Transaction,
    Operation,
    Balance,
    Trade,
    Offer,
    SignerHistory,
}

impl IndexName {
    pub const ALL: [IndexName; 7] = [
        IndexName::Ledger,
        IndexName::Transaction,
        IndexName::Operation,
        IndexName::Balance,
        IndexName::Trade,
        IndexName::Offer,
        IndexName::SignerHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexName::Ledger => "ledger",
            IndexName::Transaction => "tx",
            IndexName::Operation => "op",
            IndexName::Balance => "balance",
            IndexName::Trade => "trade",
            IndexName::Offer => "offer",
            IndexName::SignerHistory => "signer_history",
        }
    }

    /// Physical index name with the deployment prefix applied
    pub fn qualified(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.as_str())
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
