//! Core data types for the waveprint fingerprint database
//!
//! This module defines the fundamental types used throughout the crate:
//! - `FingerprintHash`: a fixed-size spectral digest used as the index key
//! - `Recording`: one cataloged audio item and its ingested fingerprints
//! - `IndexedOccurrence`: one entry of a hash's global occurrence list
//! - `Match`: a candidate alignment produced by the query path

use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte length of a fingerprint hash digest (SHA-1 sized)
pub const HASH_LEN: usize = 20;

/// A fixed-size fingerprint digest derived from a short audio spectral slice.
///
/// Opaque to this crate: the audio-analysis pipeline produces it, we only
/// use it as an index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FingerprintHash([u8; HASH_LEN]);

impl FingerprintHash {
    /// Wrap a raw digest
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a digest from its hex representation (40 hex chars)
    pub fn from_hex(s: &str) -> DbResult<Self> {
        let raw = hex::decode(s).map_err(|e| DbError::InvalidHash(e.to_string()))?;
        let bytes: [u8; HASH_LEN] = raw
            .try_into()
            .map_err(|_| DbError::InvalidHash(format!("expected {} bytes", HASH_LEN)))?;
        Ok(Self(bytes))
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Hex representation (lowercase, 40 chars)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FingerprintHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One `(hash, offset)` fingerprint already ingested for a recording.
///
/// Kept per-recording to make re-ingestion idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// The fingerprint digest
    pub hash: FingerprintHash,
    /// Frame offset within the recording where the hash was extracted
    pub offset: u32,
}

/// A cataloged recording and its fingerprinting state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Unique id, assigned once at creation, immutable thereafter
    pub recording_id: u64,
    /// Caller-supplied display name (not guaranteed unique)
    pub track_label: String,
    /// Content-derived digest of the source audio, for external dedup checks
    pub content_hash: String,
    /// True once every extracted hash has been committed to the index
    pub is_fingerprinted: bool,
    /// Fingerprints ingested so far; no duplicate `(hash, offset)` pairs
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

impl Recording {
    /// Create a fresh, unfingerprinted recording
    pub fn new(recording_id: u64, track_label: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            recording_id,
            track_label: track_label.into(),
            content_hash: content_hash.into(),
            is_fingerprinted: false,
            occurrences: Vec::new(),
        }
    }

    /// Check whether a `(hash, offset)` pair was already ingested
    pub fn has_occurrence(&self, hash: &FingerprintHash, offset: u32) -> bool {
        self.occurrences
            .iter()
            .any(|o| o.hash == *hash && o.offset == offset)
    }

    /// Summary shape handed to the listing boundary
    pub fn summary(&self) -> RecordingSummary {
        RecordingSummary {
            recording_id: self.recording_id,
            track_label: self.track_label.clone(),
            content_hash: self.content_hash.clone(),
        }
    }
}

/// One place in the whole catalog where a fingerprint hash occurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedOccurrence {
    /// Recording the hash was extracted from
    pub recording_id: u64,
    /// Track label at ingestion time
    pub track_label: String,
    /// Frame offset within that recording
    pub offset: u32,
}

/// Listing boundary shape for fingerprinted recordings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub recording_id: u64,
    pub track_label: String,
    pub content_hash: String,
}

/// A candidate alignment: a catalog recording and the time shift between
/// the query and its stored fingerprints.
///
/// If a query truly matches a recording at some fixed shift, every
/// correctly matched hash yields the same `offset_delta`; the downstream
/// ranking layer tallies these and takes the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub recording_id: u64,
    /// `query_offset - stored_offset`; negative when the query starts
    /// before the stored occurrence
    pub offset_delta: i64,
}

/// Catalog-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
    /// Total recordings in the catalog
    pub recordings: usize,
    /// Recordings with `is_fingerprinted = true`
    pub fingerprinted_recordings: usize,
    /// Distinct fingerprint hashes in the index
    pub hashes: usize,
    /// Total occurrence entries across all hashes
    pub occurrences: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(n: u8) -> FingerprintHash {
        FingerprintHash::from_bytes([n; HASH_LEN])
    }

    #[test]
    fn test_hash_hex_round_trip() {
        let h = hash(0xab);
        let hex = h.to_hex();
        assert_eq!(hex.len(), HASH_LEN * 2);
        assert_eq!(FingerprintHash::from_hex(&hex).unwrap(), h);
    }

    #[test]
    fn test_hash_from_hex_rejects_bad_input() {
        assert!(matches!(
            FingerprintHash::from_hex("zz"),
            Err(DbError::InvalidHash(_))
        ));
        // Valid hex, wrong length
        assert!(matches!(
            FingerprintHash::from_hex("abcd"),
            Err(DbError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_new_recording_is_unfingerprinted() {
        let rec = Recording::new(1, "song1", "deadbeef");
        assert!(!rec.is_fingerprinted);
        assert!(rec.occurrences.is_empty());
        assert_eq!(rec.track_label, "song1");
    }

    #[test]
    fn test_has_occurrence() {
        let mut rec = Recording::new(1, "song1", "deadbeef");
        rec.occurrences.push(Occurrence { hash: hash(1), offset: 10 });

        assert!(rec.has_occurrence(&hash(1), 10));
        assert!(!rec.has_occurrence(&hash(1), 11));
        assert!(!rec.has_occurrence(&hash(2), 10));
    }
}
