//! The ledger accessor: the only capability the record stores depend on.

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::batch::WriteBatch;
use crate::codec;
use crate::error::{LedgerError, LedgerResult};

/// A key and its stored value.
pub type KeyValue = (String, Vec<u8>);

/// Forward iterator over the results of a range or partial-key scan.
pub type StateIter<'a> = Box<dyn Iterator<Item = LedgerResult<KeyValue>> + 'a>;

/// Deterministic transaction time, fixed by whoever proposed the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl TxTimestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// RFC 3339 in UTC at whole-second precision, e.g. `2024-03-01T12:00:00Z`.
    pub fn to_rfc3339(&self) -> LedgerResult<String> {
        DateTime::from_timestamp(self.seconds, self.nanos)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .ok_or_else(|| {
                LedgerError::Timestamp(format!(
                    "{}s {}ns is out of range",
                    self.seconds, self.nanos
                ))
            })
    }
}

/// Identity and time of a transaction, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHeader {
    pub tx_id: String,
    pub timestamp: TxTimestamp,
}

impl TxHeader {
    pub fn new(tx_id: impl Into<String>, timestamp: TxTimestamp) -> Self {
        Self {
            tx_id: tx_id.into(),
            timestamp,
        }
    }
}

/// A notification emitted by a transaction and delivered on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub name: String,
    pub payload: Vec<u8>,
}

/// Read/write access to ledger state within a single transaction.
///
/// Writes staged through an accessor take effect together or not at all.
/// Reads observe committed state only, not the transaction's own writes.
pub trait LedgerAccessor {
    /// Identifier of the enclosing transaction.
    fn tx_id(&self) -> &str;

    /// Deterministic time of the enclosing transaction.
    fn tx_timestamp(&self) -> LedgerResult<TxTimestamp>;

    /// Get the value stored under `key`, or `None` if absent.
    fn get_state(&self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Stage a write of `value` under `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        self.apply_writes(WriteBatch::new().put(key, value))
    }

    /// Stage the deletion of `key`.
    fn del_state(&mut self, key: &str) -> LedgerResult<()> {
        self.apply_writes(WriteBatch::new().delete(key))
    }

    /// Stage a group of writes. Either every op is staged or none is.
    fn apply_writes(&mut self, batch: WriteBatch) -> LedgerResult<()>;

    /// Scan simple keys in `[start, end)`. An empty bound is open-ended.
    /// Composite keys are never returned.
    fn state_by_range(&self, start: &str, end: &str) -> LedgerResult<StateIter<'_>>;

    /// Scan composite keys extending `namespace` and the leading `segments`.
    fn state_by_partial_composite_key(
        &self,
        namespace: &str,
        segments: &[&str],
    ) -> LedgerResult<StateIter<'_>>;

    /// Record a notification; a later call within the same transaction
    /// replaces an earlier one.
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> LedgerResult<()>;

    fn create_composite_key(&self, namespace: &str, segments: &[&str]) -> LedgerResult<String> {
        Ok(codec::encode(namespace, segments)?)
    }

    fn split_composite_key(&self, key: &str) -> LedgerResult<(String, Vec<String>)> {
        Ok(codec::decode(key)?)
    }
}
