//! Fingerprint index: inverted map from hash to occurrences
//!
//! Owns the `fp/` keyspace. Each key is one fingerprint hash; the value
//! is the ordered list of every `(recording_id, track_label, offset)`
//! place in the catalog where that hash occurs. Appends are
//! compare-and-swap loops so two writers hitting the same hot hash
//! cannot drop each other's entries.

use crate::codec::{decode_occurrences, encode_occurrences, fingerprint_key};
use crate::error::DbResult;
use crate::store::Store;
use crate::types::{FingerprintHash, IndexedOccurrence};
use std::sync::Arc;

/// Inverted fingerprint index over a shared store handle
#[derive(Clone)]
pub struct FingerprintIndex {
    store: Arc<dyn Store>,
}

impl FingerprintIndex {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Append an occurrence to the hash's list unless the exact triple is
    /// already present. Returns whether it was new.
    pub fn append_occurrence_if_new(
        &self,
        hash: &FingerprintHash,
        recording_id: u64,
        track_label: &str,
        offset: u32,
    ) -> DbResult<bool> {
        let key = fingerprint_key(hash);

        loop {
            let raw = self.store.get(&key)?;
            let mut occurrences = match &raw {
                Some(bytes) => decode_occurrences(bytes)?,
                None => Vec::new(),
            };

            let exists = occurrences.iter().any(|o| {
                o.recording_id == recording_id
                    && o.offset == offset
                    && o.track_label == track_label
            });
            if exists {
                return Ok(false);
            }

            occurrences.push(IndexedOccurrence {
                recording_id,
                track_label: track_label.to_string(),
                offset,
            });

            let value = encode_occurrences(&occurrences)?;
            if self
                .store
                .compare_and_swap(&key, raw.as_deref(), &value)?
            {
                return Ok(true);
            }
        }
    }

    /// Every place the hash occurs in the catalog. An unknown hash is the
    /// normal no-match case and returns an empty list, never an error.
    pub fn lookup(&self, hash: &FingerprintHash) -> DbResult<Vec<IndexedOccurrence>> {
        match self.store.get(&fingerprint_key(hash))? {
            Some(raw) => decode_occurrences(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Distinct hashes and total occurrence entries in the index
    pub fn counts(&self) -> DbResult<(usize, usize)> {
        let pairs = self.store.scan_prefix(crate::codec::FINGERPRINT_PREFIX)?;
        let hashes = pairs.len();
        let mut occurrences = 0;
        for (_, raw) in pairs {
            occurrences += decode_occurrences(&raw)?.len();
        }
        Ok((hashes, occurrences))
    }
}
