//! Storage seam beneath the transaction context.

use std::sync::Arc;

use crate::accessor::KeyValue;
use crate::batch::WriteBatch;
use crate::error::LedgerResult;

/// Committed key-value state.
///
/// Implementations must apply a [`WriteBatch`] atomically: after `apply`
/// returns, either every op is visible or none is.
pub trait LedgerBackend: Send + Sync {
    /// Get the committed value for `key`.
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Entries with `start <= key < end` in ascending key order.
    /// `end = None` scans to the end of the keyspace.
    fn scan(&self, start: &str, end: Option<&str>) -> LedgerResult<Vec<KeyValue>>;

    /// Atomically apply every op in `batch`.
    fn apply(&self, batch: WriteBatch) -> LedgerResult<()>;
}

impl<B: LedgerBackend + ?Sized> LedgerBackend for Arc<B> {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn scan(&self, start: &str, end: Option<&str>) -> LedgerResult<Vec<KeyValue>> {
        (**self).scan(start, end)
    }

    fn apply(&self, batch: WriteBatch) -> LedgerResult<()> {
        (**self).apply(batch)
    }
}
