//! In-memory store backend
//!
//! A `BTreeMap` behind a mutex: ordered iteration for free, and the map
//! lock makes compare-and-swap trivially atomic. Used by tests and by
//! callers that want an ephemeral catalog.

use crate::error::{DbError, DbResult};
use crate::store::Store;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Ephemeral `BTreeMap`-backed store
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> DbResult<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> DbResult<std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.map
            .lock()
            .map_err(|e| DbError::Store(format!("store lock poisoned: {}", e)))
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.lock()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> DbResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> DbResult<bool> {
        Ok(self.lock()?.contains_key(key))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.lock()?;
        Ok(map
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> DbResult<bool> {
        let mut map = self.lock()?;
        let current = map.get(key).map(|v| v.as_slice());
        if current == expected {
            map.insert(key.to_vec(), new.to_vec());
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
