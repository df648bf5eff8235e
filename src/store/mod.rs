//! Pluggable key-value store backend
//!
//! The catalog and index are built entirely on this seam: an ordered
//! byte-key store with point operations, prefix scans, and an atomic
//! compare-and-swap. Two backends ship with the crate:
//!
//! - [`MemoryStore`]: in-process `BTreeMap`, for tests and ephemeral use
//! - [`FileStore`]: the same map persisted to a CRC-protected snapshot file
//!
//! Any store with crash-safe durability and a single-key CAS (or
//! serializable transactions) can stand in behind this trait.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::DbResult;

/// Ordered byte-key store with atomic read-modify-write support.
///
/// Implementations must be `Send + Sync`; every mutating path in this
/// crate that reads a key before writing it goes through
/// [`compare_and_swap`](Store::compare_and_swap), never plain put-over-get.
pub trait Store: Send + Sync {
    /// Point lookup; `None` if the key is absent
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Unconditional write
    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()>;

    /// Delete a key; absent keys are a no-op
    fn delete(&self, key: &[u8]) -> DbResult<()>;

    /// Existence check
    fn contains(&self, key: &[u8]) -> DbResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Snapshot of every `(key, value)` pair under a prefix, in key order.
    ///
    /// The snapshot is point-in-time best-effort: mutations that race with
    /// the scan may or may not be visible, but never corrupt the result.
    fn scan_prefix(&self, prefix: &[u8]) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Atomically replace `key`'s value with `new` iff its current value
    /// equals `expected` (`None` = key must be absent). Returns whether
    /// the swap happened.
    fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        new: &[u8],
    ) -> DbResult<bool>;
}
