//! RedbLedger — redb-backed world state for ledgerkit.
//!
//! Every [`WriteBatch`] is applied inside a single redb write transaction,
//! so a commit is all-or-nothing even across process crashes. The store
//! supports both on-disk and in-memory databases (the latter for testing).

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use ledgerkit_core::{KeyValue, LedgerBackend, LedgerResult, WriteBatch, WriteOp};
use redb::{Database, ReadableDatabase, ReadableTableMetadata};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::WORLD_STATE;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe ledger backend over a redb database.
#[derive(Clone)]
pub struct RedbLedger {
    db: Arc<Database>,
}

impl RedbLedger {
    /// Open (or create) a persistent ledger at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "ledger opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory ledger (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory ledger opened");
        Ok(store)
    }

    /// Create the world-state table if it doesn't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(WORLD_STATE).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn read_value(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORLD_STATE).map_err(map_err!(Table))?;
        let value = table
            .get(key)
            .map_err(map_err!(Read))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn read_range(&self, start: &str, end: Option<&str>) -> StateResult<Vec<KeyValue>> {
        let upper = match end {
            Some(end) if end <= start => return Ok(Vec::new()),
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORLD_STATE).map_err(map_err!(Table))?;
        let bounds: (Bound<&str>, Bound<&str>) = (Bound::Included(start), upper);
        let mut results = Vec::new();
        for entry in table.range::<&str>(bounds).map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            results.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(results)
    }

    fn write_batch(&self, batch: WriteBatch) -> StateResult<usize> {
        let count = batch.len();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(WORLD_STATE).map_err(map_err!(Table))?;
            for op in batch {
                match op {
                    WriteOp::Put { key, value } => {
                        table
                            .insert(key.as_str(), value.as_slice())
                            .map_err(map_err!(Write))?;
                    }
                    WriteOp::Delete { key } => {
                        table.remove(key.as_str()).map_err(map_err!(Write))?;
                    }
                }
            }
        }
        // Nothing is visible to readers until this commit succeeds.
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(count)
    }

    /// Number of committed keys, simple and composite.
    pub fn len(&self) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORLD_STATE).map_err(map_err!(Table))?;
        table.len().map_err(map_err!(Read))
    }

    pub fn is_empty(&self) -> StateResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl LedgerBackend for RedbLedger {
    fn get(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        Ok(self.read_value(key)?)
    }

    fn scan(&self, start: &str, end: Option<&str>) -> LedgerResult<Vec<KeyValue>> {
        Ok(self.read_range(start, end)?)
    }

    fn apply(&self, batch: WriteBatch) -> LedgerResult<()> {
        batch.validate()?;
        let count = self.write_batch(batch)?;
        debug!(ops = count, "ledger batch committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerkit_core::codec;

    fn keys(entries: Vec<KeyValue>) -> Vec<String> {
        entries.into_iter().map(|(k, _)| k).collect()
    }

    // ── Point reads and writes ─────────────────────────────────────

    #[test]
    fn apply_and_get() {
        let store = RedbLedger::open_in_memory().unwrap();
        store
            .apply(WriteBatch::new().put("A1", b"one".to_vec()))
            .unwrap();

        assert_eq!(store.get("A1").unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn get_nonexistent_returns_none() {
        let store = RedbLedger::open_in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn delete_removes_key() {
        let store = RedbLedger::open_in_memory().unwrap();
        store
            .apply(WriteBatch::new().put("A1", b"one".to_vec()))
            .unwrap();
        store.apply(WriteBatch::new().delete("A1")).unwrap();
        assert!(store.get("A1").unwrap().is_none());

        // Deleting a missing key is not an error.
        store.apply(WriteBatch::new().delete("A1")).unwrap();
    }

    // ── Batches ────────────────────────────────────────────────────

    #[test]
    fn invalid_batch_writes_nothing() {
        let store = RedbLedger::open_in_memory().unwrap();
        let result = store.apply(
            WriteBatch::new()
                .put("A1", b"one".to_vec())
                .put("A2", Vec::new()),
        );
        assert!(result.is_err());
        assert!(store.get("A1").unwrap().is_none());
    }

    #[test]
    fn batch_mixes_puts_and_deletes() {
        let store = RedbLedger::open_in_memory().unwrap();
        store
            .apply(WriteBatch::new().put("A1", b"one".to_vec()).put("A2", b"two".to_vec()))
            .unwrap();
        store
            .apply(WriteBatch::new().delete("A1").put("A3", b"three".to_vec()))
            .unwrap();

        assert_eq!(keys(store.scan("", None).unwrap()), vec!["A2", "A3"]);
    }

    // ── Ranges ─────────────────────────────────────────────────────

    #[test]
    fn scan_is_half_open_and_ordered() {
        let store = RedbLedger::open_in_memory().unwrap();
        store
            .apply(
                WriteBatch::new()
                    .put("c", b"3".to_vec())
                    .put("a", b"1".to_vec())
                    .put("b", b"2".to_vec()),
            )
            .unwrap();

        assert_eq!(keys(store.scan("a", Some("c")).unwrap()), vec!["a", "b"]);
        assert_eq!(keys(store.scan("b", None).unwrap()), vec!["b", "c"]);
        assert!(store.scan("c", Some("a")).unwrap().is_empty());
    }

    #[test]
    fn composite_keys_sort_before_simple_keys() {
        let store = RedbLedger::open_in_memory().unwrap();
        let composite = codec::encode("owner~assetID", &["alice", "A1"]).unwrap();
        store
            .apply(WriteBatch::new().put("A1", b"1".to_vec()).put(composite.clone(), vec![0]))
            .unwrap();

        assert_eq!(keys(store.scan("", None).unwrap()), vec![composite, "A1".to_string()]);
        assert_eq!(keys(store.scan("\u{1}", None).unwrap()), vec!["A1"]);
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("ledger.redb");

        {
            let store = RedbLedger::open(&db_path).unwrap();
            store
                .apply(WriteBatch::new().put("A1", b"one".to_vec()))
                .unwrap();
        }

        // Reopen the same database file.
        let store = RedbLedger::open(&db_path).unwrap();
        assert_eq!(store.get("A1").unwrap(), Some(b"one".to_vec()));
    }
}
