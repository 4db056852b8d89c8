// Coffer: auth error types

use thiserror::Error;

/// The only outcome a rejected request ever sees.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,
}
