// Coffer: store error types
//
// `DbError` carries engine detail and stays inside the store. `StoreError`
// is what the vault store hands to its callers: coarse kinds only, so no
// driver codes or row descriptions reach the API.

use thiserror::Error;

/// Engine-level failure raised by a transaction provider.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("column {index} is not {expected}")]
    ColumnType { index: usize, expected: &'static str },

    #[error("column {0} is out of range")]
    ColumnIndex(usize),

    #[error("unsupported column type at index {0}")]
    UnsupportedColumn(usize),

    #[error("{0}")]
    Other(String),
}

/// Failure kinds of the vault store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vault not found")]
    NotFound(i64),

    #[error("transaction failed")]
    Transaction,

    #[error("failed to get vault")]
    Read,

    #[error("failed to write vault")]
    Write,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
