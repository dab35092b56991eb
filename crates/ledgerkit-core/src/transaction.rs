//! Transaction context: buffers writes and commits them as one batch.

use std::collections::BTreeMap;

use tracing::debug;

use crate::accessor::{LedgerAccessor, LedgerEvent, StateIter, TxHeader, TxTimestamp};
use crate::backend::LedgerBackend;
use crate::batch::{WriteBatch, WriteOp, validate_key};
use crate::codec;
use crate::error::{CommitError, LedgerError, LedgerResult};

/// Start of the simple-key space; everything below it is composite.
const SIMPLE_KEY_START: &str = "\u{1}";

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    pub tx_id: String,
    pub timestamp: TxTimestamp,
    /// Number of distinct keys written or deleted.
    pub writes: usize,
    pub event: Option<LedgerEvent>,
}

/// A single logical transaction over a [`LedgerBackend`].
///
/// Reads go straight to committed state. Writes are buffered per key until
/// [`Transaction::commit`]; dropping the transaction discards them.
pub struct Transaction<'a, B: LedgerBackend + ?Sized> {
    backend: &'a B,
    header: TxHeader,
    /// `None` marks a pending delete.
    writes: BTreeMap<String, Option<Vec<u8>>>,
    event: Option<LedgerEvent>,
}

impl<'a, B: LedgerBackend + ?Sized> Transaction<'a, B> {
    pub fn new(backend: &'a B, header: TxHeader) -> Self {
        Self {
            backend,
            header,
            writes: BTreeMap::new(),
            event: None,
        }
    }

    /// Number of keys with a pending write.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    pub fn pending_event(&self) -> Option<&LedgerEvent> {
        self.event.as_ref()
    }

    /// Apply every buffered write to the backend in one batch.
    pub fn commit(self) -> Result<CommitReceipt, CommitError> {
        let writes = self.writes.len();
        let batch: WriteBatch = self
            .writes
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => WriteOp::Put { key, value },
                None => WriteOp::Delete { key },
            })
            .collect();

        if !batch.is_empty() {
            self.backend.apply(batch).map_err(|source| CommitError {
                tx_id: self.header.tx_id.clone(),
                source,
            })?;
        }

        debug!(tx_id = %self.header.tx_id, writes, "transaction committed");
        Ok(CommitReceipt {
            tx_id: self.header.tx_id,
            timestamp: self.header.timestamp,
            writes,
            event: self.event,
        })
    }

    fn scan(&self, start: &str, end: Option<&str>) -> LedgerResult<StateIter<'_>> {
        let entries = self.backend.scan(start, end)?;
        Ok(Box::new(entries.into_iter().map(Ok)))
    }
}

impl<B: LedgerBackend + ?Sized> LedgerAccessor for Transaction<'_, B> {
    fn tx_id(&self) -> &str {
        &self.header.tx_id
    }

    fn tx_timestamp(&self) -> LedgerResult<TxTimestamp> {
        Ok(self.header.timestamp)
    }

    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        validate_key(key)?;
        self.backend.get(key)
    }

    fn apply_writes(&mut self, batch: WriteBatch) -> LedgerResult<()> {
        batch.validate()?;
        for op in batch {
            match op {
                WriteOp::Put { key, value } => {
                    self.writes.insert(key, Some(value));
                }
                WriteOp::Delete { key } => {
                    self.writes.insert(key, None);
                }
            }
        }
        Ok(())
    }

    fn state_by_range(&self, start: &str, end: &str) -> LedgerResult<StateIter<'_>> {
        for bound in [start, end] {
            if codec::is_composite(bound) {
                return Err(LedgerError::InvalidKey {
                    key: bound.to_string(),
                    reason: "range bounds must be simple keys".to_string(),
                });
            }
        }
        let start = if start.is_empty() {
            SIMPLE_KEY_START
        } else {
            start
        };
        let end = (!end.is_empty()).then_some(end);
        self.scan(start, end)
    }

    fn state_by_partial_composite_key(
        &self,
        namespace: &str,
        segments: &[&str],
    ) -> LedgerResult<StateIter<'_>> {
        let (start, end) = codec::prefix_range(namespace, segments)?;
        self.scan(&start, Some(&end))
    }

    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> LedgerResult<()> {
        if name.is_empty() {
            return Err(LedgerError::InvalidValue {
                key: String::new(),
                reason: "event name cannot be empty".to_string(),
            });
        }
        self.event = Some(LedgerEvent {
            name: name.to_string(),
            payload,
        });
        Ok(())
    }
}

/// Entry point for running operations against a backend, one transaction
/// per call.
#[derive(Debug, Clone, Default)]
pub struct Ledger<B> {
    backend: B,
}

impl<B: LedgerBackend> Ledger<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Open a transaction; nothing is written until it is committed.
    pub fn begin(&self, header: TxHeader) -> Transaction<'_, B> {
        Transaction::new(&self.backend, header)
    }

    /// Run `op` in a fresh transaction and commit it if `op` succeeds.
    ///
    /// When `op` fails the transaction is dropped and no write or event
    /// reaches the ledger.
    pub fn submit<T, E, F>(&self, header: TxHeader, op: F) -> Result<(T, CommitReceipt), E>
    where
        F: FnOnce(&mut Transaction<'_, B>) -> Result<T, E>,
        E: From<CommitError>,
    {
        let mut tx = self.begin(header);
        let output = op(&mut tx)?;
        let receipt = tx.commit()?;
        Ok((output, receipt))
    }

    /// Run a read-only `op` against committed state.
    pub fn query<T, E, F>(&self, header: TxHeader, op: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_, B>) -> Result<T, E>,
    {
        let tx = self.begin(header);
        op(&tx)
    }
}
