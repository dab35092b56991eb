//! Write batches: groups of puts and deletes applied as one unit.

use crate::error::{LedgerError, LedgerResult};

/// A single staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Set a key to a value.
    Put { key: String, value: Vec<u8> },
    /// Delete a key.
    Delete { key: String },
}

impl WriteOp {
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::Delete { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }

    /// Check the op is well-formed without applying it.
    pub fn validate(&self) -> LedgerResult<()> {
        validate_key(self.key())?;
        if let WriteOp::Put { key, value } = self {
            if value.is_empty() {
                return Err(LedgerError::InvalidValue {
                    key: key.clone(),
                    reason: "value cannot be empty; use a delete instead".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// An ordered group of writes. Later ops on the same key win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.ops.push(WriteOp::put(key, value));
        self
    }

    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push(WriteOp::delete(key));
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Validate every op; fails on the first malformed one.
    pub fn validate(&self) -> LedgerResult<()> {
        self.ops.iter().try_for_each(WriteOp::validate)
    }
}

impl IntoIterator for WriteBatch {
    type Item = WriteOp;
    type IntoIter = std::vec::IntoIter<WriteOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

/// Validate that a key is usable as a ledger key.
pub fn validate_key(key: &str) -> LedgerResult<()> {
    if key.is_empty() {
        return Err(LedgerError::InvalidKey {
            key: String::new(),
            reason: "key cannot be empty".to_string(),
        });
    }
    Ok(())
}
