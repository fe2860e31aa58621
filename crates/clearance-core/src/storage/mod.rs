//! # Storage Backends
//!
//! A string-keyed blob store, the shape of browser local storage.
//!
//! - `MemoryStore`: volatile `BTreeMap`, used for tests and `--backend memory`
//! - `RedbStore`: disk-backed ACID storage via redb
//!
//! Every failure surfaces as `ClearanceError::StorageUnavailable`; deciding
//! whether to fall back is the caller's job.

mod redb_store;

pub use redb_store::RedbStore;

use crate::ClearanceError;
use std::collections::BTreeMap;

/// Raw key-value capability the state store is built on.
pub trait KeyValueStore {
    /// Read the blob stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ClearanceError>;

    /// Store `value` under `key`, replacing any previous blob.
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), ClearanceError>;

    /// Delete `key`. Returns whether it existed.
    fn remove(&mut self, key: &str) -> Result<bool, ClearanceError>;

    /// All keys, in ascending order.
    fn keys(&self) -> Result<Vec<String>, ClearanceError>;
}

/// In-memory store. Volatile.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ClearanceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), ClearanceError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, ClearanceError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, ClearanceError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// Either backend, chosen at runtime.
#[derive(Debug)]
pub enum StorageBackend {
    /// Volatile in-memory map.
    InMemory(MemoryStore),
    /// Disk-backed redb database.
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ClearanceError> {
        match self {
            Self::InMemory(store) => store.get(key),
            Self::Persistent(store) => store.get(key),
        }
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), ClearanceError> {
        match self {
            Self::InMemory(store) => store.put(key, value),
            Self::Persistent(store) => store.put(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<bool, ClearanceError> {
        match self {
            Self::InMemory(store) => store.remove(key),
            Self::Persistent(store) => store.remove(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>, ClearanceError> {
        match self {
            Self::InMemory(store) => store.keys(),
            Self::Persistent(store) => store.keys(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_put_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.get("student-data").expect("get").is_none());

        store.put("student-data", b"{}").expect("put");
        assert_eq!(store.get("student-data").expect("get").as_deref(), Some(&b"{}"[..]));

        assert!(store.remove("student-data").expect("remove"));
        assert!(!store.remove("student-data").expect("remove again"));
    }

    #[test]
    fn keys_are_sorted() {
        let mut store = StorageBackend::default();
        store.put("b", b"2").expect("put");
        store.put("a", b"1").expect("put");
        assert_eq!(store.keys().expect("keys"), vec!["a".to_string(), "b".to_string()]);
        assert!(!store.is_persistent());
    }
}
