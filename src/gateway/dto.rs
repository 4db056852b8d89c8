// Coffer: HTTP request bodies
//
// Missing fields deserialize to their empty values so that an absent field
// is a validation failure (422), while a body that is not the right JSON
// shape at all is a decode failure (400).

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::store::{NewVault, SecretEntry};

/// A request body that decoded but does not satisfy its field rules.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(String);

impl ValidationError {
    fn required(fields: &[&str]) -> Self {
        let detail = fields
            .iter()
            .map(|f| format!("field {} is a required", f))
            .collect::<Vec<_>>()
            .join(", ");
        Self(format!("validation error: {}", detail))
    }

    fn invalid(field: &str) -> Self {
        Self(format!("validation error: field {} is not valid", field))
    }
}

// ─── Create Vault ────────────────────────────────────────────────────────────

/// `POST /root/create` body.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct CreateVaultRequest {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

impl CreateVaultRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.data.is_empty() {
            missing.push("data");
        }
        if !missing.is_empty() {
            return Err(ValidationError::required(&missing));
        }

        let blank = |s: &str| s.chars().all(|c| c == ' ');
        if self.data.iter().any(|(k, v)| blank(k) || blank(v)) {
            return Err(ValidationError(
                "key or value length can't be 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn into_new_vault(self) -> NewVault {
        NewVault {
            name: self.name,
            entries: self
                .data
                .into_iter()
                .map(|(key, value)| SecretEntry { key, value })
                .collect(),
        }
    }
}

impl fmt::Debug for CreateVaultRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateVaultRequest")
            .field("name", &self.name)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─── Create Token ────────────────────────────────────────────────────────────

/// `POST /root/create-token` body. `expires` is a lifetime in seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTokenRequest {
    pub vault_id: i64,
    pub expires: i64,
}

impl CreateTokenRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_at(chrono::Utc::now().timestamp())
    }

    /// Validate against the issue time `now`. The expiry `now + expires`
    /// must fit in an i64.
    pub fn validate_at(&self, now: i64) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.vault_id == 0 {
            missing.push("vault_id");
        }
        if self.expires == 0 {
            missing.push("expires");
        }
        if !missing.is_empty() {
            return Err(ValidationError::required(&missing));
        }

        if self.expires < 0 || now.checked_add(self.expires).is_none() {
            return Err(ValidationError::invalid("expires"));
        }

        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
