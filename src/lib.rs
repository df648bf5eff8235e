//! # Waveprint
//!
//! Acoustic fingerprint catalog and matching engine: stores the
//! `(hash, offset)` fingerprints extracted from reference recordings in
//! an inverted index, and turns a query fingerprint set into a stream of
//! offset-aligned match candidates.
//!
//! ## Features
//!
//! - **Inverted index**: hash → every `(recording, offset)` occurrence
//! - **Idempotent ingestion**: re-running a batch never duplicates entries
//! - **Offset-delta matching**: constant delta across true matches, ready
//!   for downstream voting
//! - **Pluggable store**: any ordered byte-key backend with compare-and-swap
//! - **Durability**: CRC-protected snapshot persistence out of the box
//!
//! ## Modules
//!
//! - [`db`]: the `FingerprintDb` facade most callers use
//! - [`catalog`]: recording records and their lifecycle
//! - [`index`]: the inverted fingerprint index
//! - [`ingest`]: fan-out writes into catalog and index
//! - [`matcher`]: the offset-delta query path
//! - [`store`]: the key-value backend seam
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waveprint::{DatabaseConfig, FingerprintDb, FingerprintHash};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = FingerprintDb::open(DatabaseConfig::new("waveprint_data"))?;
//!
//!     // Catalog a reference recording (hashes come from the audio pipeline)
//!     let id = db.create_recording("song1", "0a1b2c...")?;
//!     let h1 = FingerprintHash::from_bytes([0x11; 20]);
//!     let h2 = FingerprintHash::from_bytes([0x22; 20]);
//!     db.ingest_batch(id, &[(h1, 0), (h2, 5)])?;
//!     db.mark_fingerprinted(id)?;
//!
//!     // Match a query clip; equal deltas vote for the same alignment
//!     for candidate in db.matches(vec![(h1, 3), (h2, 8)]) {
//!         let m = candidate?;
//!         println!("recording {} at delta {}", m.recording_id, m.offset_delta);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod allocator;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod ingest;
pub mod matcher;
pub mod store;
pub mod types;

// Re-export top-level types for convenience
pub use allocator::IdAllocator;
pub use catalog::Catalog;
pub use config::DatabaseConfig;
pub use db::FingerprintDb;
pub use error::{DbError, DbResult};
pub use index::FingerprintIndex;
pub use ingest::Ingestor;
pub use matcher::{MatchStream, Matcher};
pub use store::{FileStore, MemoryStore, Store};
pub use types::{
    DatabaseStats, FingerprintHash, IndexedOccurrence, Match, Occurrence, Recording,
    RecordingSummary, HASH_LEN,
};
