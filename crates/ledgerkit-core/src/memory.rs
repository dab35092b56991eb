//! In-memory ledger backend.
//!
//! Not durable: state is lost when the value is dropped. Intended for tests
//! and for embedding the record stores without a database.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;
use tracing::debug;

use crate::accessor::KeyValue;
use crate::backend::LedgerBackend;
use crate::batch::{WriteBatch, WriteOp};
use crate::error::LedgerResult;

/// Ordered in-memory key-value state.
///
/// A `BTreeMap` gives the same key order as the on-disk backend; the
/// write lock is held for the whole of `apply`, so batches are atomic.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of every committed entry in key order.
    pub fn entries(&self) -> Vec<KeyValue> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl LedgerBackend for MemoryLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn scan(&self, start: &str, end: Option<&str>) -> LedgerResult<Vec<KeyValue>> {
        let data = self.data.read();
        let upper = match end {
            Some(end) if end <= start => return Ok(Vec::new()),
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let entries = data
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(entries)
    }

    fn apply(&self, batch: WriteBatch) -> LedgerResult<()> {
        batch.validate()?;
        let count = batch.len();
        let mut data = self.data.write();
        for op in batch {
            match op {
                WriteOp::Put { key, value } => {
                    data.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        debug!(ops = count, "memory ledger batch applied");
        Ok(())
    }
}
