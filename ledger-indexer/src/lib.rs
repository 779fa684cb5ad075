//! Ledger Search Indexer Library
//!
//! Exports closed ledgers from a validator's history database into a search
//! index: one document per ledger, transaction, operation, balance change,
//! trade, offer event and signer change, keyed by a paging token that orders
//! them exactly as they were applied. A reconciliation pass finds ledgers
//! the index is missing and re-exports them.

pub mod api;
pub mod config;
pub mod core;
pub mod database;
pub mod models;
pub mod processors;
pub mod services;
pub mod stream;
pub mod xdr;

// Re-export commonly used types
pub use crate::config::IndexerConfig;
pub use crate::core::{IndexerError, IndexerResult, PagingToken};
