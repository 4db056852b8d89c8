// Coffer: HS512 token codec
//
// Wire form: base64url(header) "." base64url(claims) "." base64url(mac),
// unpadded, where mac = HMAC-SHA512(secret, header "." claims).

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::Zeroizing;

use super::error::TokenError;

type HmacSha512 = Hmac<Sha512>;

const ALGORITHM: &str = "HS512";
const TOKEN_TYPE: &str = "JWT";

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    vault_id: i64,
    exp: i64,
}

// ─── Free functions ──────────────────────────────────────────────────────────

/// Issue a token bound to `vault_id` that expires `ttl_secs` seconds from now.
///
/// The ttl is always interpreted as seconds.
pub fn issue_token(vault_id: i64, secret: &[u8], ttl_secs: i64) -> Result<String, TokenError> {
    issue_token_at(vault_id, secret, ttl_secs, now())
}

/// Same as [`issue_token`] with an explicit current time in unix seconds.
pub fn issue_token_at(
    vault_id: i64,
    secret: &[u8],
    ttl_secs: i64,
    now: i64,
) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Signing("signing secret is empty".to_string()));
    }
    let exp = now
        .checked_add(ttl_secs)
        .ok_or_else(|| TokenError::Signing("token expiry overflows".to_string()))?;

    let header = encode_segment(&Header {
        alg: ALGORITHM.to_string(),
        typ: Some(TOKEN_TYPE.to_string()),
    })?;
    let claims = encode_segment(&Claims { vault_id, exp })?;

    let mut mac = new_mac(secret).map_err(|e| TokenError::Signing(e.to_string()))?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(claims.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    tracing::debug!(vault_id, exp, "Vault token issued");

    Ok(format!("{}.{}.{}", header, claims, signature))
}

/// Validate a token and return the vault id it is bound to.
///
/// Structure, algorithm, signature and expiry are all checked; any failure
/// is reported as [`TokenError::Invalid`].
pub fn validate_token(token: &str, secret: &[u8]) -> Result<i64, TokenError> {
    validate_token_at(token, secret, now())
}

/// Same as [`validate_token`] with an explicit current time in unix seconds.
pub fn validate_token_at(token: &str, secret: &[u8], now: i64) -> Result<i64, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::Invalid);
    }

    let mut parts = token.split('.');
    let (header_b64, claims_b64, signature_b64) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(c), Some(s)) => (h, c, s),
        _ => return Err(TokenError::Invalid),
    };
    if parts.next().is_some() {
        return Err(TokenError::Invalid);
    }

    let header: Header = decode_segment(header_b64)?;
    if header.alg != ALGORITHM {
        return Err(TokenError::Invalid);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| TokenError::Invalid)?;
    let mut mac = new_mac(secret).map_err(|_| TokenError::Invalid)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(claims_b64.as_bytes());
    // Constant-time comparison.
    mac.verify_slice(&signature).map_err(|_| TokenError::Invalid)?;

    let claims: Claims = decode_segment(claims_b64)?;
    if now >= claims.exp {
        return Err(TokenError::Invalid);
    }

    Ok(claims.vault_id)
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn new_mac(secret: &[u8]) -> Result<HmacSha512, hmac::digest::InvalidLength> {
    HmacSha512::new_from_slice(secret)
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)
}

// ─── Codec ───────────────────────────────────────────────────────────────────

/// Holds the configured signing secret.
pub struct TokenCodec {
    secret: Zeroizing<Vec<u8>>,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Zeroizing::new(secret.to_vec()),
        }
    }

    pub fn issue(&self, vault_id: i64, ttl_secs: i64) -> Result<String, TokenError> {
        issue_token(vault_id, &self.secret, ttl_secs)
    }

    pub fn issue_at(&self, vault_id: i64, ttl_secs: i64, now: i64) -> Result<String, TokenError> {
        issue_token_at(vault_id, &self.secret, ttl_secs, now)
    }

    pub fn validate(&self, token: &str) -> Result<i64, TokenError> {
        validate_token(token, &self.secret)
    }

    pub fn validate_at(&self, token: &str, now: i64) -> Result<i64, TokenError> {
        validate_token_at(token, &self.secret, now)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
