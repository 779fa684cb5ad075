//! Centralized error types for the ledger indexer

use thiserror::Error;

/// Main indexer error type
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Source database error: {0}")]
    Source(#[from] SourceError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Ordering key overflow: {field} = {value} does not fit in 8 bits")]
    OrderingOverflow { field: &'static str, value: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors raised while decoding binary ledger records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {offset}: needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("unknown {kind} discriminant {value}")]
    UnknownDiscriminant { kind: &'static str, value: i32 },

    #[error("{kind} length {len} exceeds maximum {max}")]
    LengthExceeded {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    #[error("non-zero padding at byte {offset}")]
    NonZeroPadding { offset: usize },

    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),

    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("invalid record: {0}")]
    Invalid(String),
}

/// Source database errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Row {table}/{key} is malformed: {reason}")]
    MalformedRow {
        table: &'static str,
        key: String,
        reason: String,
    },
}

/// Document index errors
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Index responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Bulk request rejected {failed} of {total} documents: {reason}")]
    BulkRejected {
        failed: usize,
        total: usize,
        reason: String,
    },

    #[error("Unexpected response: {0}")]
    Response(String),
}

/// Result type alias for indexer operations
pub type IndexerResult<T> = Result<T, IndexerError>;

impl IndexerError {
    /// Whether the error is worth retrying as a whole request
    pub fn is_transient(&self) -> bool {
        matches!(self, IndexerError::Index(_))
    }
}

/// Helper to convert sqlx errors
impl From<sqlx::Error> for IndexerError {
    fn from(err: sqlx::Error) -> Self {
        IndexerError::Source(SourceError::Database(err.to_string()))
    }
}

/// Helper to convert HTTP client errors
impl From<reqwest::Error> for IndexerError {
    fn from(err: reqwest::Error) -> Self {
        IndexerError::Index(IndexError::Transport(err.to_string()))
    }
}

impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        IndexerError::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for DecodeError {
    fn from(err: base64::DecodeError) -> Self {
        DecodeError::Base64(err.to_string())
    }
}
