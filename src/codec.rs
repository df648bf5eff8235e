//! Encoding layer: key construction and value codecs
//!
//! Three keyspaces share one store:
//! - `meta/recording_counter` → big-endian u64 (the id counter)
//! - `song/<id, 8 bytes BE>` → bincode `Recording`
//! - `fp/<hash, 20 bytes>` → bincode `Vec<IndexedOccurrence>`
//!
//! Recording ids are encoded big-endian so store iteration order over the
//! `song/` prefix matches id order. The exact byte layout is private to
//! this crate; nothing else reads the store.

use crate::error::DbResult;
use crate::types::{FingerprintHash, IndexedOccurrence, Recording, HASH_LEN};

/// Key prefix for recording records
pub const SONG_PREFIX: &[u8] = b"song/";
/// Key prefix for fingerprint occurrence lists
pub const FINGERPRINT_PREFIX: &[u8] = b"fp/";
/// Singleton key holding the recording id counter
pub const COUNTER_KEY: &[u8] = b"meta/recording_counter";

/// Build the store key for a recording id
pub fn recording_key(recording_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(SONG_PREFIX.len() + 8);
    key.extend_from_slice(SONG_PREFIX);
    key.extend_from_slice(&recording_id.to_be_bytes());
    key
}

/// Build the store key for a fingerprint hash
pub fn fingerprint_key(hash: &FingerprintHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(FINGERPRINT_PREFIX.len() + HASH_LEN);
    key.extend_from_slice(FINGERPRINT_PREFIX);
    key.extend_from_slice(hash.as_bytes());
    key
}

/// Serialize a recording record
pub fn encode_recording(recording: &Recording) -> DbResult<Vec<u8>> {
    Ok(bincode::serialize(recording)?)
}

/// Deserialize a recording record
pub fn decode_recording(raw: &[u8]) -> DbResult<Recording> {
    Ok(bincode::deserialize(raw)?)
}

/// Serialize a hash's occurrence list
pub fn encode_occurrences(occurrences: &[IndexedOccurrence]) -> DbResult<Vec<u8>> {
    Ok(bincode::serialize(occurrences)?)
}

/// Deserialize a hash's occurrence list
pub fn decode_occurrences(raw: &[u8]) -> DbResult<Vec<IndexedOccurrence>> {
    Ok(bincode::deserialize(raw)?)
}

/// Encode the id counter value
pub fn encode_counter(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode the id counter value
pub fn decode_counter(raw: &[u8]) -> DbResult<u64> {
    let bytes: [u8; 8] = raw.try_into().map_err(|_| {
        crate::error::DbError::Corruption(format!(
            "counter value has {} bytes, expected 8",
            raw.len()
        ))
    })?;
    Ok(u64::from_be_bytes(bytes))
}
