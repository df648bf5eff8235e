//! Catalog store: recording records and their lifecycle
//!
//! Owns the `song/` keyspace. A recording is created unfingerprinted,
//! accumulates occurrences through ingestion, is marked fingerprinted
//! exactly once all its hashes are committed, and may only be deleted
//! while still unfingerprinted (the cleanup sweep for abandoned
//! ingestions). Every read-modify-write on a record goes through the
//! store's compare-and-swap so concurrent writers cannot lose updates.

use crate::allocator::IdAllocator;
use crate::codec::{
    decode_recording, encode_recording, recording_key, SONG_PREFIX,
};
use crate::error::{DbError, DbResult};
use crate::store::Store;
use crate::types::{FingerprintHash, Occurrence, Recording, RecordingSummary};
use std::sync::Arc;

/// Recording catalog over a shared store handle
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
    allocator: IdAllocator,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let allocator = IdAllocator::new(Arc::clone(&store));
        Self { store, allocator }
    }

    /// Create a new unfingerprinted recording and return its id.
    ///
    /// An id collision here means the allocator's atomicity was violated
    /// by the backend; that is a fatal integrity error, not a retry case.
    pub fn create_recording(
        &self,
        track_label: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> DbResult<u64> {
        let recording_id = self.allocator.allocate()?;
        let recording = Recording::new(recording_id, track_label, content_hash);

        let key = recording_key(recording_id);
        let value = encode_recording(&recording)?;
        if !self.store.compare_and_swap(&key, None, &value)? {
            return Err(DbError::DuplicateRecordingId(recording_id));
        }

        tracing::debug!("created recording {} ({})", recording_id, recording.track_label);
        Ok(recording_id)
    }

    /// Point lookup by id
    pub fn get_recording(&self, recording_id: u64) -> DbResult<Option<Recording>> {
        match self.store.get(&recording_key(recording_id))? {
            Some(raw) => Ok(Some(decode_recording(&raw)?)),
            None => Ok(None),
        }
    }

    /// Load a recording, failing if it does not exist
    fn require_recording(&self, recording_id: u64) -> DbResult<(Vec<u8>, Recording)> {
        match self.store.get(&recording_key(recording_id))? {
            Some(raw) => {
                let recording = decode_recording(&raw)?;
                Ok((raw, recording))
            }
            None => Err(DbError::RecordingNotFound(recording_id)),
        }
    }

    /// Set the fingerprinted flag. Idempotent once set; fails with
    /// `RecordingNotFound` for an unknown id.
    pub fn mark_fingerprinted(&self, recording_id: u64) -> DbResult<()> {
        loop {
            let (raw, mut recording) = self.require_recording(recording_id)?;
            if recording.is_fingerprinted {
                return Ok(());
            }

            recording.is_fingerprinted = true;
            let value = encode_recording(&recording)?;
            let key = recording_key(recording_id);
            if self.store.compare_and_swap(&key, Some(&raw), &value)? {
                tracing::debug!("recording {} marked fingerprinted", recording_id);
                return Ok(());
            }
            // Raced with another writer on this record; reload and retry
        }
    }

    /// Append a `(hash, offset)` pair to the recording's own occurrence
    /// list unless already present. Returns whether the pair was new.
    pub fn append_occurrence_if_new(
        &self,
        recording_id: u64,
        hash: FingerprintHash,
        offset: u32,
    ) -> DbResult<bool> {
        loop {
            let (raw, mut recording) = self.require_recording(recording_id)?;
            if recording.has_occurrence(&hash, offset) {
                return Ok(false);
            }

            recording.occurrences.push(Occurrence { hash, offset });
            let value = encode_recording(&recording)?;
            let key = recording_key(recording_id);
            if self.store.compare_and_swap(&key, Some(&raw), &value)? {
                return Ok(true);
            }
        }
    }

    /// Lazily yield a summary of every fingerprinted recording.
    ///
    /// Iterates a point-in-time snapshot of the catalog keyspace;
    /// mutations racing with the scan may or may not be visible.
    pub fn list_fingerprinted(
        &self,
    ) -> DbResult<impl Iterator<Item = DbResult<RecordingSummary>>> {
        let pairs = self.store.scan_prefix(SONG_PREFIX)?;
        Ok(pairs.into_iter().filter_map(|(_, raw)| {
            match decode_recording(&raw) {
                Ok(rec) if rec.is_fingerprinted => Some(Ok(rec.summary())),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        }))
    }

    /// Delete every recording still unfingerprinted; returns how many
    /// were removed. Fingerprinted recordings are never touched.
    pub fn delete_unfingerprinted(&self) -> DbResult<usize> {
        let pairs = self.store.scan_prefix(SONG_PREFIX)?;
        let mut removed = 0;

        for (key, raw) in pairs {
            let recording = decode_recording(&raw)?;
            if !recording.is_fingerprinted {
                self.store.delete(&key)?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!("swept {} unfingerprinted recordings", removed);
        }
        Ok(removed)
    }

    /// Total recordings and how many are fingerprinted
    pub fn counts(&self) -> DbResult<(usize, usize)> {
        let pairs = self.store.scan_prefix(SONG_PREFIX)?;
        let total = pairs.len();
        let mut fingerprinted = 0;
        for (_, raw) in pairs {
            if decode_recording(&raw)?.is_fingerprinted {
                fingerprinted += 1;
            }
        }
        Ok((total, fingerprinted))
    }
}
