//! File-backed store backend
//!
//! Keeps the full keyspace in memory (same `BTreeMap` as [`MemoryStore`])
//! and persists it as a single snapshot file. Snapshot format:
//!
//! - magic: `WVPT` (4 bytes)
//! - version: u32 LE
//! - length: u32 LE (payload bytes)
//! - payload: bincode-encoded map
//! - crc: u32 LE, CRC32 of length + payload
//!
//! The snapshot is written to a temp file and renamed into place, so a
//! crash mid-persist leaves the previous snapshot intact. A truncated or
//! checksum-failing snapshot refuses to open rather than silently loading
//! partial data.

use crate::error::{DbError, DbResult};
use crate::store::Store;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const MAGIC: &[u8; 4] = b"WVPT";
const FORMAT_VERSION: u32 = 1;

type KvMap = BTreeMap<Vec<u8>, Vec<u8>>;

struct Inner {
    map: KvMap,
    dirty: bool,
}

/// Snapshot-persistent store
pub struct FileStore {
    inner: Mutex<Inner>,
    path: PathBuf,
    /// Persist after every mutation when true, else only on explicit
    /// `persist()` and on drop
    sync_on_write: bool,
}

impl FileStore {
    /// Open a store, loading the snapshot at `path` if one exists
    pub fn open(path: impl AsRef<Path>, sync_on_write: bool) -> DbResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let map = if path.exists() {
            let map = Self::load_snapshot(&path)?;
            tracing::debug!("loaded {} keys from {}", map.len(), path.display());
            map
        } else {
            KvMap::new()
        };

        Ok(Self {
            inner: Mutex::new(Inner { map, dirty: false }),
            path,
            sync_on_write,
        })
    }

    fn load_snapshot(path: &Path) -> DbResult<KvMap> {
        let mut file = File::open(path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        if buf.len() < 16 || &buf[0..4] != MAGIC {
            return Err(DbError::Corruption(format!(
                "not a waveprint snapshot: {}",
                path.display()
            )));
        }

        let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(DbError::Corruption(format!(
                "unsupported snapshot version {}",
                version
            )));
        }

        let len = u32::from_le_bytes(buf[8..12].try_into().unwrap()) as usize;
        if buf.len() != 12 + len + 4 {
            return Err(DbError::Corruption("truncated snapshot".to_string()));
        }

        let payload = &buf[12..12 + len];
        let stored_crc = u32::from_le_bytes(buf[12 + len..].try_into().unwrap());

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf[8..12]);
        hasher.update(payload);
        if hasher.finalize() != stored_crc {
            return Err(DbError::Corruption("snapshot checksum mismatch".to_string()));
        }

        Ok(bincode::deserialize(payload)?)
    }

    fn write_snapshot(path: &Path, map: &KvMap) -> DbResult<()> {
        let payload = bincode::serialize(map)?;
        let len = (payload.len() as u32).to_le_bytes();

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&len);
        hasher.update(&payload);
        let crc = hasher.finalize();

        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(MAGIC)?;
            file.write_all(&FORMAT_VERSION.to_le_bytes())?;
            file.write_all(&len)?;
            file.write_all(&payload)?;
            file.write_all(&crc.to_le_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| DbError::Store(format!("store lock poisoned: {}", e)))
    }

    /// Flush the current state to disk if anything changed
    pub fn persist(&self) -> DbResult<()> {
        let mut inner = self.lock()?;
        self.persist_locked(&mut inner)
    }

    fn persist_locked(&self, inner: &mut Inner) -> DbResult<()> {
        if !inner.dirty {
            return Ok(());
        }
        Self::write_snapshot(&self.path, &inner.map)?;
        inner.dirty = false;
        Ok(())
    }

    fn after_mutation(&self, inner: &mut Inner) -> DbResult<()> {
        inner.dirty = true;
        if self.sync_on_write {
            self.persist_locked(inner)?;
        }
        Ok(())
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for FileStore {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.lock()?.map.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        let mut inner = self.lock()?;
        inner.map.insert(key.to_vec(), value.to_vec());
        self.after_mutation(&mut inner)
    }

    fn delete(&self, key: &[u8]) -> DbResult<()> {
        let mut inner = self.lock()?;
        if inner.map.remove(key).is_some() {
            self.after_mutation(&mut inner)?;
        }
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> DbResult<bool> {
        Ok(self.lock()?.map.contains_key(key))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let inner = self.lock()?;
        Ok(inner
            .map
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
        let mut inner = self.lock()?;
        let current = inner.map.get(key).map(|v| v.as_slice());
        if current != expected {
            return Ok(false);
        }
        inner.map.insert(key.to_vec(), new.to_vec());
        self.after_mutation(&mut inner)?;
        Ok(true)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Best-effort flush of unsynced mutations
        if let Ok(mut inner) = self.inner.lock() {
            if inner.dirty {
                if let Err(e) = Self::write_snapshot(&self.path, &inner.map) {
                    tracing::warn!("failed to persist store snapshot on drop: {}", e);
                } else {
                    inner.dirty = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_snapshot_opens_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("catalog.db"), false).unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let store = FileStore::open(&path, false).unwrap();
            store.put(b"k1", b"v1").unwrap();
            store.put(b"k2", b"v2").unwrap();
            store.persist().unwrap();
        }

        let store = FileStore::open(&path, false).unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get(b"k2").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_persist_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let store = FileStore::open(&path, false).unwrap();
            store.put(b"k", b"v").unwrap();
            // No explicit persist; Drop flushes
        }

        let store = FileStore::open(&path, false).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_sync_on_write_survives_without_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        let store = FileStore::open(&path, true).unwrap();
        store.put(b"k", b"v").unwrap();

        // Read the snapshot back while the first handle is still alive
        let map = FileStore::load_snapshot(&path).unwrap();
        assert_eq!(map.get(b"k".as_slice()), Some(&b"v".to_vec()));
    }

    #[test]
    fn test_corrupt_snapshot_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let store = FileStore::open(&path, false).unwrap();
            store.put(b"k", b"v").unwrap();
            store.persist().unwrap();
        }

        // Flip a payload byte
        let mut bytes = std::fs::read(&path).unwrap();
        let mid = bytes.len() - 6;
        bytes[mid] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            FileStore::open(&path, false),
            Err(DbError::Corruption(_))
        ));
    }

    #[test]
    fn test_truncated_snapshot_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let store = FileStore::open(&path, false).unwrap();
            store.put(b"k", b"v").unwrap();
            store.persist().unwrap();
        }

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(matches!(
            FileStore::open(&path, false),
            Err(DbError::Corruption(_))
        ));
    }

    #[test]
    fn test_cas_semantics_match_memory_store() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("catalog.db"), false).unwrap();

        assert!(store.compare_and_swap(b"k", None, b"v1").unwrap());
        assert!(!store.compare_and_swap(b"k", None, b"v2").unwrap());
        assert!(!store.compare_and_swap(b"k", Some(b"wrong"), b"v2").unwrap());
        assert!(store.compare_and_swap(b"k", Some(b"v1"), b"v2").unwrap());
        assert_eq!(store.get(b"k").unwrap(), Some(b"v2".to_vec()));
    }
}
