//! # redb-backed Key-Value Storage
//!
//! A disk-backed blob store using the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! One table holds every blob. Each `put`/`remove` is its own write
//! transaction, so the last committed write wins.

use super::KeyValueStore;
use crate::ClearanceError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for blobs: key string -> raw bytes
const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn unavailable(e: impl std::fmt::Display) -> ClearanceError {
    ClearanceError::StorageUnavailable(e.to_string())
}

/// A key-value store persisted in a redb file.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClearanceError> {
        let db = Database::create(path.as_ref()).map_err(unavailable)?;

        // Create the table up front so read transactions never miss it.
        let write_txn = db.begin_write().map_err(unavailable)?;
        {
            let _ = write_txn.open_table(KV).map_err(unavailable)?;
        }
        write_txn.commit().map_err(unavailable)?;

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), ClearanceError> {
        self.db.compact().map_err(unavailable)?;
        Ok(())
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ClearanceError> {
        let read_txn = self.db.begin_read().map_err(unavailable)?;
        let table = read_txn.open_table(KV).map_err(unavailable)?;
        let value = table
            .get(key)
            .map_err(unavailable)?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), ClearanceError> {
        let write_txn = self.db.begin_write().map_err(unavailable)?;
        {
            let mut table = write_txn.open_table(KV).map_err(unavailable)?;
            table.insert(key, value).map_err(unavailable)?;
        }
        write_txn.commit().map_err(unavailable)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, ClearanceError> {
        let write_txn = self.db.begin_write().map_err(unavailable)?;
        let existed = {
            let mut table = write_txn.open_table(KV).map_err(unavailable)?;
            let removed = table.remove(key).map_err(unavailable)?;
            removed.is_some()
        };
        write_txn.commit().map_err(unavailable)?;
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>, ClearanceError> {
        let read_txn = self.db.begin_read().map_err(unavailable)?;
        let table = read_txn.open_table(KV).map_err(unavailable)?;

        let mut keys = Vec::new();
        for entry in table.iter().map_err(unavailable)? {
            let (key, _) = entry.map_err(unavailable)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

// =============================================================================
// TESTS
// =============================================================================
