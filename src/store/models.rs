// Coffer: vault data models
//
// SECURITY: secret values are plaintext in memory and in the database.
// They are never included in Debug output or log messages; only keys are.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// One key/value secret belonging to a vault.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretEntry {
    pub key: String,
    pub value: String,
}

impl SecretEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretEntry")
            .field("key", &self.key)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Input for creating a vault.
///
/// Callers guarantee a non-empty name and a non-empty list of entries with
/// non-empty keys and values; the store does not check again. Keys are not
/// required to be unique.
#[derive(Debug, Clone)]
pub struct NewVault {
    pub name: String,
    pub entries: Vec<SecretEntry>,
}

/// A vault read back from the store, with its entries folded into a map.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Vault {
    pub id: i64,
    pub name: String,
    pub data: BTreeMap<String, String>,
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_debug_redacts_value() {
        let entry = SecretEntry::new("password", "hunter2");
        let debug_output = format!("{:?}", entry);
        assert!(debug_output.contains("password"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(
            !debug_output.contains("hunter2"),
            "Debug output must NEVER contain the raw secret"
        );
    }

    #[test]
    fn test_vault_debug_shows_keys_only() {
        let vault = Vault {
            id: 1,
            name: "db".to_string(),
            data: BTreeMap::from([("user".to_string(), "alice".to_string())]),
        };
        let debug_output = format!("{:?}", vault);
        assert!(debug_output.contains("user"));
        assert!(!debug_output.contains("alice"));
    }

    #[test]
    fn test_vault_serializes_with_data() {
        let vault = Vault {
            id: 1,
            name: "db".to_string(),
            data: BTreeMap::from([("user".to_string(), "alice".to_string())]),
        };
        let json = serde_json::to_value(&vault).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "name": "db", "data": {"user": "alice"}})
        );
    }
}
