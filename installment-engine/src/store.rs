//! redb-based session persistence
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `session` | logical key | JSON bytes | Stage records, provisional doc no, legacy mirrors |
//! | `attachments` | slot key | JSON bytes | KYC images / signature slots |
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate`, so a `put` that returns is
//! on disk. Stage-change notifications are only emitted after the commit,
//! which is what keeps observers from seeing non-durable state.
//!
//! This is the only mutable shared resource in the engine; all writes go
//! through [`crate::steps::StepStore`] and
//! [`crate::docnum::IdentifierAllocator`].

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Session table: key = logical key, value = JSON-serialized value
const SESSION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

/// Attachment table: key = slot key, value = JSON-serialized AttachmentSlot
const ATTACHMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("attachments");

/// Authoritative superset of all four stage records
pub const SESSION_KEY: &str = "installment.session";

/// Provisional document number pending server confirmation
pub const PROVISIONAL_DOC_KEY: &str = "installment.provisionalDocNo";

/// Legacy mirror of the stage-1 cart, kept write-through for older UI code
pub const LEGACY_CART_ITEMS_KEY: &str = "cartItems";

/// Second legacy cart mirror (read-fallback only)
pub const LEGACY_CART_DATA_KEY: &str = "cartData";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Key/value session store backed by redb
#[derive(Clone)]
pub struct SessionStore {
    db: Arc<Database>,
}

impl SessionStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        // Create tables up front so readers never race table creation
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(SESSION_TABLE)?;
            let _ = write_txn.open_table(ATTACHMENTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put_in(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &impl Serialize,
    ) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table)?;
            t.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get_in<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StoreResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        match t.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Persist a value under a logical key; durable once this returns
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.put_in(SESSION_TABLE, key, value)
    }

    /// Read a value back, `None` when the key was never written
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        self.get_in(SESSION_TABLE, key)
    }

    /// Remove a single key (no-op when absent)
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(SESSION_TABLE)?;
            t.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove several keys in one transaction
    pub fn remove_many(&self, keys: &[&str]) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(SESSION_TABLE)?;
            for key in keys {
                t.remove(*key)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    // ========== Attachment slots ==========

    pub fn put_attachment<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        self.put_in(ATTACHMENTS_TABLE, key, value)
    }

    pub fn get_attachment<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        self.get_in(ATTACHMENTS_TABLE, key)
    }

    /// Drop every attachment slot (used by the session `clear`)
    pub fn clear_attachments(&self) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(ATTACHMENTS_TABLE)?;
            t.retain(|_, _| false)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
