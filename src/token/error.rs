// Coffer: token error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    /// The token could not be produced. The detail is for logs only.
    #[error("failed to sign token: {0}")]
    Signing(String),

    /// Malformed, wrong algorithm, bad signature or expired. Callers are
    /// never told which.
    #[error("invalid token")]
    Invalid,
}
