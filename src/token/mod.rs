// Coffer: vault access tokens
//
// A vault token is a compact HS512 JWT whose claims bind exactly one vault
// id and an absolute expiry in unix seconds. Tokens are stateless; nothing
// about them is stored.

mod codec;
mod error;

pub use codec::{issue_token, issue_token_at, validate_token, validate_token_at, TokenCodec};
pub use error::TokenError;
