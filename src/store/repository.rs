// Coffer: vault store repository
//
// Each operation runs inside its own transaction obtained from the
// provider. Engine errors are logged here with full detail and replaced by
// a coarse `StoreError` kind before leaving this module.

use std::collections::BTreeMap;

use super::error::{DbError, StoreError};
use super::models::{NewVault, Vault};
use super::tx::{Transaction, TransactionProvider, Value};

const INSERT_VAULT: &str = "INSERT INTO vault (name) VALUES (?1) RETURNING id";

const INSERT_ENTRY: &str = "INSERT INTO vault_entry (vault_id, key, value) VALUES (?1, ?2, ?3)";

const SELECT_VAULT: &str = "SELECT id, name FROM vault WHERE id = ?1";

// No ORDER BY: entry order is unspecified, so duplicate keys fold
// in whatever order the engine returns them.
const SELECT_ENTRIES: &str = "SELECT key, value FROM vault_entry WHERE vault_id = ?1";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable storage for vaults and their secret entries.
pub trait VaultStore {
    /// Atomically create a vault and all of its entries. Returns the new id.
    fn create_vault(&self, vault: &NewVault) -> Result<i64, StoreError>;

    /// Read a vault with its entries folded into a key/value map.
    fn get_vault(&self, id: i64) -> Result<Vault, StoreError>;

    /// Succeed only if a vault with this id exists.
    fn check_vault(&self, id: i64) -> Result<(), StoreError>;
}

// ─── SQL Implementation ──────────────────────────────────────────────────────

pub struct SqlVaultStore<P> {
    provider: P,
}

impl<P: TransactionProvider> SqlVaultStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn begin(&self, op: &'static str) -> Result<P::Tx<'_>, StoreError> {
        self.provider.begin().map_err(|e| {
            tracing::error!(op, error = %e, "failed to begin transaction");
            StoreError::Transaction
        })
    }
}

impl<P: TransactionProvider> VaultStore for SqlVaultStore<P> {
    fn create_vault(&self, vault: &NewVault) -> Result<i64, StoreError> {
        const OP: &str = "store.create_vault";

        let mut tx = self.begin(OP)?;

        let row = tx
            .query_row(INSERT_VAULT, &[Value::from(vault.name.as_str())])
            .map_err(|e| write_failed(OP, "failed to create new vault", e))?
            .ok_or_else(|| {
                write_failed(
                    OP,
                    "failed to create new vault",
                    DbError::Other("insert returned no id".to_string()),
                )
            })?;
        let id = row
            .integer(0)
            .map_err(|e| write_failed(OP, "failed to create new vault", e))?;

        for entry in &vault.entries {
            tx.execute(
                INSERT_ENTRY,
                &[
                    Value::Integer(id),
                    Value::from(entry.key.as_str()),
                    Value::from(entry.value.as_str()),
                ],
            )
            .map_err(|e| write_failed(OP, "failed to insert values to database", e))?;
        }

        tx.commit().map_err(|e| {
            tracing::error!(op = OP, error = %e, "failed to commit transaction");
            StoreError::Transaction
        })?;

        tracing::info!(
            vault_id = id,
            entries = vault.entries.len(),
            "Vault stored successfully"
        );

        Ok(id)
    }

    fn get_vault(&self, id: i64) -> Result<Vault, StoreError> {
        const OP: &str = "store.get_vault";

        let mut tx = self.begin(OP)?;
        let name = read_header(&mut tx, id, OP)?;

        let rows = tx
            .query_rows(SELECT_ENTRIES, &[Value::Integer(id)])
            .map_err(|e| read_failed(OP, "failed to get vault values", e))?;

        let mut data = BTreeMap::new();
        for row in rows {
            let key = row
                .text(0)
                .map_err(|e| read_failed(OP, "failed to scan values", e))?;
            let value = row
                .text(1)
                .map_err(|e| read_failed(OP, "failed to scan values", e))?;
            data.insert(key.to_string(), value.to_string());
        }

        finish_read(tx, OP);

        tracing::debug!(vault_id = id, keys = data.len(), "Vault read");

        Ok(Vault { id, name, data })
    }

    fn check_vault(&self, id: i64) -> Result<(), StoreError> {
        const OP: &str = "store.check_vault";

        let mut tx = self.begin(OP)?;
        read_header(&mut tx, id, OP)?;
        finish_read(tx, OP);

        Ok(())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Look up the vault header row and return the vault name.
fn read_header<T: Transaction>(tx: &mut T, id: i64, op: &'static str) -> Result<String, StoreError> {
    let row = tx
        .query_row(SELECT_VAULT, &[Value::Integer(id)])
        .map_err(|e| read_failed(op, "failed to get vault", e))?;

    match row {
        Some(row) => row
            .text(1)
            .map(str::to_string)
            .map_err(|e| read_failed(op, "failed to scan vault", e)),
        None => {
            tracing::warn!(op, vault_id = id, "vault not found");
            Err(StoreError::NotFound(id))
        }
    }
}

/// End a read-only transaction. The data is already in hand, so a failed
/// rollback is only logged.
fn finish_read<T: Transaction>(tx: T, op: &'static str) {
    if let Err(e) = tx.rollback() {
        tracing::warn!(op, error = %e, "failed to release read transaction");
    }
}

fn write_failed(op: &'static str, message: &'static str, e: DbError) -> StoreError {
    tracing::error!(op, error = %e, "{}", message);
    StoreError::Write
}

fn read_failed(op: &'static str, message: &'static str, e: DbError) -> StoreError {
    tracing::error!(op, error = %e, "{}", message);
    StoreError::Read
}

// ─── Tests ───────────────────────────────────────────────────────────────────
