// Coffer: root and user gates

use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::error::AuthError;
use crate::token::TokenCodec;

const BEARER_PREFIX: &str = "Bearer ";

/// Which gate admitted a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    User,
}

/// The identity attached to an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    /// Full access: create vaults, read any vault, issue tokens.
    Root,
    /// Read-only access to exactly one vault.
    Vault(i64),
}

impl AuthScope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            AuthScope::Root => ScopeKind::Root,
            AuthScope::Vault(_) => ScopeKind::User,
        }
    }

    /// The bound vault for a user scope, `None` for root.
    pub fn vault_id(&self) -> Option<i64> {
        match self {
            AuthScope::Root => None,
            AuthScope::Vault(id) => Some(*id),
        }
    }
}

/// Strip one leading `"Bearer "` from an authorization header value.
/// A missing header yields an empty credential.
pub fn bearer_token(header: Option<&str>) -> &str {
    match header {
        Some(value) => value.strip_prefix(BEARER_PREFIX).unwrap_or(value),
        None => "",
    }
}

/// Decides whether a request with the given authorization header is admitted.
pub trait Gate: Send + Sync {
    fn authorize(&self, header: Option<&str>) -> Result<AuthScope, AuthError>;
}

// ─── Root Gate ───────────────────────────────────────────────────────────────

pub struct RootGate {
    root_token: Zeroizing<String>,
}

impl RootGate {
    pub fn new(root_token: &str) -> Self {
        Self {
            root_token: Zeroizing::new(root_token.to_string()),
        }
    }
}

impl Gate for RootGate {
    fn authorize(&self, header: Option<&str>) -> Result<AuthScope, AuthError> {
        let credential = bearer_token(header);
        if credential.is_empty() || self.root_token.is_empty() {
            tracing::warn!(gate = "root", "rejected: empty credential");
            return Err(AuthError::Unauthorized);
        }

        if bool::from(credential.as_bytes().ct_eq(self.root_token.as_bytes())) {
            Ok(AuthScope::Root)
        } else {
            tracing::warn!(gate = "root", "rejected: credential mismatch");
            Err(AuthError::Unauthorized)
        }
    }
}

impl fmt::Debug for RootGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootGate")
            .field("root_token", &"[REDACTED]")
            .finish()
    }
}

// ─── User Gate ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct UserGate {
    codec: Arc<TokenCodec>,
}

impl UserGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }
}

impl Gate for UserGate {
    fn authorize(&self, header: Option<&str>) -> Result<AuthScope, AuthError> {
        let credential = bearer_token(header);
        if credential.is_empty() {
            tracing::warn!(gate = "user", "rejected: empty credential");
            return Err(AuthError::Unauthorized);
        }

        match self.codec.validate(credential) {
            Ok(vault_id) => Ok(AuthScope::Vault(vault_id)),
            Err(e) => {
                tracing::warn!(gate = "user", error = %e, "rejected: token validation failed");
                Err(AuthError::Unauthorized)
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
