//! Query/match engine: offset-delta alignment
//!
//! For every query `(hash, query_offset)` pair, every stored occurrence
//! of that hash yields one candidate `(recording_id, offset_delta)` with
//! `offset_delta = query_offset - stored_offset`. A true match at a fixed
//! time shift produces the same delta for every matched hash, so the
//! downstream voting layer tallies `(recording_id, delta)` and takes the
//! mode. No ranking happens here.

use crate::error::DbResult;
use crate::index::FingerprintIndex;
use crate::types::{FingerprintHash, Match};

/// Read-side engine over the fingerprint index
#[derive(Clone)]
pub struct Matcher {
    index: FingerprintIndex,
}

impl Matcher {
    pub fn new(index: FingerprintIndex) -> Self {
        Self { index }
    }

    /// All `(recording_id, stored_offset)` occurrences of one hash, with
    /// the track label projected out. Empty for an unknown hash.
    pub fn query_hash(
        &self,
        hash: &FingerprintHash,
    ) -> DbResult<impl Iterator<Item = (u64, u32)>> {
        let occurrences = self.index.lookup(hash)?;
        Ok(occurrences.into_iter().map(|o| (o.recording_id, o.offset)))
    }

    /// Lazy stream of alignment candidates for a query fingerprint set.
    ///
    /// Input order is preserved; each hash's occurrences come out in
    /// index order. Index lookups happen as the stream is consumed, so
    /// errors surface as `Err` items mid-stream.
    pub fn matches<I>(&self, query_pairs: I) -> MatchStream<'_, I::IntoIter>
    where
        I: IntoIterator<Item = (FingerprintHash, u32)>,
    {
        MatchStream {
            index: &self.index,
            pairs: query_pairs.into_iter(),
            pending: Vec::new().into_iter(),
        }
    }
}

/// Lazy iterator over alignment candidates; see [`Matcher::matches`]
pub struct MatchStream<'a, I> {
    index: &'a FingerprintIndex,
    pairs: I,
    pending: std::vec::IntoIter<Match>,
}

impl<I> Iterator for MatchStream<'_, I>
where
    I: Iterator<Item = (FingerprintHash, u32)>,
{
    type Item = DbResult<Match>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(m) = self.pending.next() {
                return Some(Ok(m));
            }

            let (hash, query_offset) = self.pairs.next()?;
            match self.index.lookup(&hash) {
                Ok(occurrences) => {
                    self.pending = occurrences
                        .into_iter()
                        .map(|o| Match {
                            recording_id: o.recording_id,
                            offset_delta: i64::from(query_offset) - i64::from(o.offset),
                        })
                        .collect::<Vec<_>>()
                        .into_iter();
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};
    use crate::types::HASH_LEN;
    use std::sync::Arc;

    fn setup() -> (FingerprintIndex, Matcher) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let index = FingerprintIndex::new(store);
        let matcher = Matcher::new(index.clone());
        (index, matcher)
    }

    fn hash(n: u8) -> FingerprintHash {
        FingerprintHash::from_bytes([n; HASH_LEN])
    }

    #[test]
    fn test_query_unknown_hash_is_empty() {
        let (_, matcher) = setup();
        assert_eq!(matcher.query_hash(&hash(1)).unwrap().count(), 0);
    }

    #[test]
    fn test_query_hash_projects_label_out() {
        let (index, matcher) = setup();
        index.append_occurrence_if_new(&hash(1), 5, "song1", 10).unwrap();
        index.append_occurrence_if_new(&hash(1), 6, "song2", 20).unwrap();

        let results: Vec<(u64, u32)> = matcher.query_hash(&hash(1)).unwrap().collect();
        assert_eq!(results, vec![(5, 10), (6, 20)]);
    }

    #[test]
    fn test_constant_delta_across_matched_pairs() {
        let (index, matcher) = setup();
        index.append_occurrence_if_new(&hash(1), 5, "song1", 10).unwrap();
        index.append_occurrence_if_new(&hash(2), 5, "song1", 20).unwrap();

        let matches: Vec<Match> = matcher
            .matches(vec![(hash(1), 13), (hash(2), 23)])
            .collect::<DbResult<_>>()
            .unwrap();

        assert_eq!(
            matches,
            vec![
                Match { recording_id: 5, offset_delta: 3 },
                Match { recording_id: 5, offset_delta: 3 },
            ]
        );
    }

    #[test]
    fn test_negative_delta() {
        let (index, matcher) = setup();
        index.append_occurrence_if_new(&hash(1), 5, "song1", 100).unwrap();

        let matches: Vec<Match> = matcher
            .matches(vec![(hash(1), 40)])
            .collect::<DbResult<_>>()
            .unwrap();
        assert_eq!(matches[0].offset_delta, -60);
    }

    #[test]
    fn test_unknown_hashes_skipped_mid_query() {
        let (index, matcher) = setup();
        index.append_occurrence_if_new(&hash(1), 5, "song1", 0).unwrap();

        let matches: Vec<Match> = matcher
            .matches(vec![(hash(9), 7), (hash(1), 2), (hash(8), 3)])
            .collect::<DbResult<_>>()
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].recording_id, 5);
    }

    #[test]
    fn test_one_query_hash_fans_out_per_occurrence() {
        let (index, matcher) = setup();
        index.append_occurrence_if_new(&hash(1), 5, "song1", 10).unwrap();
        index.append_occurrence_if_new(&hash(1), 6, "song2", 40).unwrap();

        let matches: Vec<Match> = matcher
            .matches(vec![(hash(1), 50)])
            .collect::<DbResult<_>>()
            .unwrap();
        assert_eq!(
            matches,
            vec![
                Match { recording_id: 5, offset_delta: 40 },
                Match { recording_id: 6, offset_delta: 10 },
            ]
        );
    }
}
