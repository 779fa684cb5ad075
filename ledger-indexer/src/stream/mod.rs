//! Ledger close meta stream input

pub mod frame;
pub mod ledger_close;

pub use frame::FrameReader;
pub use ledger_close::{network_id, LedgerCloseDecoder, LedgerCloseRecord};
