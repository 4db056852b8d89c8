// Coffer: store module
//
// Durable vault storage on SQLite. Each vault operation runs in its own
// transaction; engine errors are logged in the repository and never
// escape past `StoreError`.

mod db;
mod error;
mod models;
mod repository;
mod tx;

pub use db::{Database, SqliteTx};
pub use error::{DbError, StoreError};
pub use models::{NewVault, SecretEntry, Vault};
pub use repository::{SqlVaultStore, VaultStore};
pub use tx::{Row, Transaction, TransactionProvider, Value};
