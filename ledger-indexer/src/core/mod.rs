//! Core domain abstractions and types
//!
//! This module contains the foundational types, traits, and error definitions
//! that form the core of the indexer's domain model. It's designed to be
//! independent of any specific infrastructure concerns.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{DecodeError, IndexError, IndexerError, IndexerResult, SourceError};
pub use traits::{BulkOutcome, DocumentIndex, Indexable, LedgerSource, RangeCount};
pub use types::{order_from_position, EffectCounter, EffectGroup, IndexName, PagingToken, SeqGap};
