// Coffer: top-level error types
//
// Aggregates the errors that can stop the process at startup or while a
// command runs.

use thiserror::Error;

use crate::config::ConfigError;
use crate::retry::RetryError;
use crate::store::DbError;

#[derive(Debug, Error)]
pub enum CofferError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Failed to open database: {0}")]
    Connect(#[from] RetryError<DbError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CofferError>;
