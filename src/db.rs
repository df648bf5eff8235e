//! Database facade
//!
//! Wires the catalog, index, ingestor, and matcher over one shared store
//! handle. Most callers only ever touch this type.

use crate::catalog::Catalog;
use crate::config::DatabaseConfig;
use crate::error::DbResult;
use crate::index::FingerprintIndex;
use crate::ingest::Ingestor;
use crate::matcher::{MatchStream, Matcher};
use crate::store::{FileStore, MemoryStore, Store};
use crate::types::{DatabaseStats, FingerprintHash, Recording, RecordingSummary};
use std::sync::Arc;

/// Fingerprint catalog, index, and matching engine over one store
pub struct FingerprintDb {
    catalog: Catalog,
    index: FingerprintIndex,
    ingestor: Ingestor,
    matcher: Matcher,
    file_store: Option<Arc<FileStore>>,
}

impl FingerprintDb {
    /// Open (or create) an on-disk database under the configured data dir
    pub fn open(config: DatabaseConfig) -> DbResult<Self> {
        let store = Arc::new(FileStore::open(config.store_path(), config.sync_on_write)?);
        let mut db = Self::with_store(Arc::clone(&store) as Arc<dyn Store>);
        db.file_store = Some(store);
        tracing::info!("opened fingerprint database at {}", config.data_dir.display());
        Ok(db)
    }

    /// Ephemeral in-memory database, mainly for tests and experiments
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Build over any store implementation
    pub fn with_store(store: Arc<dyn Store>) -> Self {
        let catalog = Catalog::new(Arc::clone(&store));
        let index = FingerprintIndex::new(store);
        let ingestor = Ingestor::new(catalog.clone(), index.clone());
        let matcher = Matcher::new(index.clone());

        Self {
            catalog,
            index,
            ingestor,
            matcher,
            file_store: None,
        }
    }

    /// Register a new recording; returns its id
    pub fn create_recording(
        &self,
        track_label: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> DbResult<u64> {
        self.catalog.create_recording(track_label, content_hash)
    }

    /// Point lookup by id
    pub fn get_recording(&self, recording_id: u64) -> DbResult<Option<Recording>> {
        self.catalog.get_recording(recording_id)
    }

    /// Ingest one extracted `(hash, offset)` pair
    pub fn ingest_one(
        &self,
        recording_id: u64,
        hash: FingerprintHash,
        offset: u32,
    ) -> DbResult<()> {
        self.ingestor.ingest_one(recording_id, hash, offset)
    }

    /// Ingest a batch of extracted pairs in order
    pub fn ingest_batch(
        &self,
        recording_id: u64,
        pairs: &[(FingerprintHash, u32)],
    ) -> DbResult<usize> {
        self.ingestor.ingest_batch(recording_id, pairs)
    }

    /// Mark a recording fully fingerprinted (idempotent)
    pub fn mark_fingerprinted(&self, recording_id: u64) -> DbResult<()> {
        self.catalog.mark_fingerprinted(recording_id)
    }

    /// Lazily list every fingerprinted recording
    pub fn list_fingerprinted(
        &self,
    ) -> DbResult<impl Iterator<Item = DbResult<RecordingSummary>>> {
        self.catalog.list_fingerprinted()
    }

    /// Sweep recordings whose ingestion never completed
    pub fn delete_unfingerprinted(&self) -> DbResult<usize> {
        self.catalog.delete_unfingerprinted()
    }

    /// All stored occurrences of one hash as `(recording_id, offset)`
    pub fn query_hash(
        &self,
        hash: &FingerprintHash,
    ) -> DbResult<impl Iterator<Item = (u64, u32)>> {
        self.matcher.query_hash(hash)
    }

    /// Lazy alignment-candidate stream for a query fingerprint set
    pub fn matches<I>(&self, query_pairs: I) -> MatchStream<'_, I::IntoIter>
    where
        I: IntoIterator<Item = (FingerprintHash, u32)>,
    {
        self.matcher.matches(query_pairs)
    }

    /// Catalog-wide counters
    pub fn stats(&self) -> DbResult<DatabaseStats> {
        let (recordings, fingerprinted_recordings) = self.catalog.counts()?;
        let (hashes, occurrences) = self.index.counts()?;
        Ok(DatabaseStats {
            recordings,
            fingerprinted_recordings,
            hashes,
            occurrences,
        })
    }

    /// Flush the store snapshot if this database is file-backed;
    /// a no-op for in-memory databases
    pub fn persist(&self) -> DbResult<()> {
        match &self.file_store {
            Some(store) => store.persist(),
            None => Ok(()),
        }
    }
}
