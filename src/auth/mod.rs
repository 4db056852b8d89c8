// Coffer: two-tier authentication
//
// Each request passes exactly one gate. The root gate compares the bearer
// credential with the configured root token; the user gate validates a
// vault token and binds the request to that token's vault.

mod error;
mod gate;

pub use error::AuthError;
pub use gate::{bearer_token, AuthScope, Gate, RootGate, ScopeKind, UserGate};
