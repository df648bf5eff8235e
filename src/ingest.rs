//! Ingestion engine: fan-out writes to catalog and index
//!
//! One ingested `(hash, offset)` pair lands in two places: the
//! recording's own occurrence list (so re-ingestion is idempotent) and
//! the global inverted index (so queries can find it). The two lists
//! deduplicate independently and are not transactionally linked; a crash
//! between them leaves a still-unfingerprinted recording that is safe to
//! re-ingest or sweep.

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::index::FingerprintIndex;
use crate::types::FingerprintHash;

/// Writes extracted fingerprints into the catalog and index
#[derive(Clone)]
pub struct Ingestor {
    catalog: Catalog,
    index: FingerprintIndex,
}

impl Ingestor {
    pub fn new(catalog: Catalog, index: FingerprintIndex) -> Self {
        Self { catalog, index }
    }

    /// Ingest a single `(hash, offset)` pair for an existing recording.
    ///
    /// Both sides are attempted even when one reports a duplicate: the
    /// per-recording list and the index list are deduplicated separately.
    /// Re-running with identical arguments changes nothing.
    pub fn ingest_one(
        &self,
        recording_id: u64,
        hash: FingerprintHash,
        offset: u32,
    ) -> DbResult<()> {
        let recording = self
            .catalog
            .get_recording(recording_id)?
            .ok_or(DbError::RecordingNotFound(recording_id))?;

        self.catalog
            .append_occurrence_if_new(recording_id, hash, offset)?;
        self.index.append_occurrence_if_new(
            &hash,
            recording_id,
            &recording.track_label,
            offset,
        )?;

        Ok(())
    }

    /// Ingest a batch of pairs in order. No atomicity across the batch:
    /// the first failure aborts the rest, leaving a partially ingested
    /// recording that a retry (idempotent) or sweep will handle. Returns
    /// the number of pairs processed.
    pub fn ingest_batch(
        &self,
        recording_id: u64,
        pairs: &[(FingerprintHash, u32)],
    ) -> DbResult<usize> {
        for (hash, offset) in pairs {
            self.ingest_one(recording_id, *hash, *offset)?;
        }

        tracing::debug!(
            "ingested {} fingerprints for recording {}",
            pairs.len(),
            recording_id
        );
        Ok(pairs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};
    use crate::types::HASH_LEN;
    use std::sync::Arc;

    fn setup() -> (Catalog, FingerprintIndex, Ingestor) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(Arc::clone(&store));
        let index = FingerprintIndex::new(Arc::clone(&store));
        let ingestor = Ingestor::new(catalog.clone(), index.clone());
        (catalog, index, ingestor)
    }

    fn hash(n: u8) -> FingerprintHash {
        FingerprintHash::from_bytes([n; HASH_LEN])
    }

    #[test]
    fn test_ingest_one_updates_both_sides() {
        let (catalog, index, ingestor) = setup();
        let id = catalog.create_recording("song1", "h").unwrap();

        ingestor.ingest_one(id, hash(1), 42).unwrap();

        let rec = catalog.get_recording(id).unwrap().unwrap();
        assert_eq!(rec.occurrences.len(), 1);

        let found = index.lookup(&hash(1)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].recording_id, id);
        assert_eq!(found[0].offset, 42);
    }

    #[test]
    fn test_ingest_one_is_idempotent() {
        let (catalog, index, ingestor) = setup();
        let id = catalog.create_recording("song1", "h").unwrap();

        ingestor.ingest_one(id, hash(1), 42).unwrap();
        ingestor.ingest_one(id, hash(1), 42).unwrap();

        assert_eq!(catalog.get_recording(id).unwrap().unwrap().occurrences.len(), 1);
        assert_eq!(index.lookup(&hash(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_ingest_unknown_recording_fails() {
        let (_, _, ingestor) = setup();
        assert!(matches!(
            ingestor.ingest_one(404, hash(1), 0),
            Err(DbError::RecordingNotFound(404))
        ));
    }

    #[test]
    fn test_ingest_batch_overlapping_rerun() {
        let (catalog, index, ingestor) = setup();
        let id = catalog.create_recording("song1", "h").unwrap();

        let pairs = vec![(hash(1), 0), (hash(2), 5), (hash(3), 9)];
        assert_eq!(ingestor.ingest_batch(id, &pairs).unwrap(), 3);

        // Re-running the same batch plus one new pair only adds the new one
        let mut extended = pairs.clone();
        extended.push((hash(4), 14));
        ingestor.ingest_batch(id, &extended).unwrap();

        assert_eq!(catalog.get_recording(id).unwrap().unwrap().occurrences.len(), 4);
        assert_eq!(index.lookup(&hash(1)).unwrap().len(), 1);
        assert_eq!(index.lookup(&hash(4)).unwrap().len(), 1);
    }

    #[test]
    fn test_batch_aborts_on_first_error() {
        let (catalog, index, ingestor) = setup();
        let id = catalog.create_recording("song1", "h").unwrap();

        // Ingest into id, then delete it mid-batch via the sweep to force
        // a failure on the remaining pairs
        ingestor.ingest_one(id, hash(1), 0).unwrap();
        catalog.delete_unfingerprinted().unwrap();

        let pairs = vec![(hash(2), 1), (hash(3), 2)];
        assert!(ingestor.ingest_batch(id, &pairs).is_err());
        assert!(index.lookup(&hash(2)).unwrap().is_empty());
        assert!(index.lookup(&hash(3)).unwrap().is_empty());
    }

    #[test]
    fn test_same_pair_from_two_recordings_both_indexed() {
        let (catalog, index, ingestor) = setup();
        let a = catalog.create_recording("song1", "ha").unwrap();
        let b = catalog.create_recording("song2", "hb").unwrap();

        ingestor.ingest_one(a, hash(1), 10).unwrap();
        ingestor.ingest_one(b, hash(1), 10).unwrap();

        // Index entries are keyed by recording too, so both survive
        assert_eq!(index.lookup(&hash(1)).unwrap().len(), 2);
    }
}
