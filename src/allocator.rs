//! Recording id allocation
//!
//! A single durable counter issues strictly increasing recording ids.
//! Allocation is a compare-and-swap loop, never a plain read-then-write:
//! two writers losing an update here would hand out the same id and
//! corrupt the catalog. Ids start at 1 and are never reused, even after
//! a recording is deleted.

use crate::codec::{decode_counter, encode_counter, COUNTER_KEY};
use crate::error::DbResult;
use crate::store::Store;
use std::sync::Arc;

/// Retries before logging contention on the counter key
const CONTENTION_WARN_AFTER: u32 = 16;

/// Issues unique, monotonically increasing recording ids
#[derive(Clone)]
pub struct IdAllocator {
    store: Arc<dyn Store>,
}

impl IdAllocator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Allocate the next recording id.
    ///
    /// Loops until the CAS lands; contention only ever costs retries,
    /// never a duplicate id.
    pub fn allocate(&self) -> DbResult<u64> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if attempts == CONTENTION_WARN_AFTER {
                tracing::warn!("id counter contention: {} CAS retries", attempts);
            }

            match self.store.get(COUNTER_KEY)? {
                None => {
                    // First allocation ever: claim id 1, leave 2 behind
                    if self
                        .store
                        .compare_and_swap(COUNTER_KEY, None, &encode_counter(2))?
                    {
                        return Ok(1);
                    }
                }
                Some(raw) => {
                    let current = decode_counter(&raw)?;
                    if self.store.compare_and_swap(
                        COUNTER_KEY,
                        Some(&raw),
                        &encode_counter(current + 1),
                    )? {
                        return Ok(current);
                    }
                }
            }
        }
    }
}
