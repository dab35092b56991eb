//! Error types shared by the ledger accessor and the record stores.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Result type alias for ledger accessor operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result type alias for record store operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors produced by the composite key codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed composite key {key:?}: {reason}")]
    MalformedKey { key: String, reason: String },

    #[error("invalid composite key segment {segment:?}: {reason}")]
    InvalidSegment { segment: String, reason: String },
}

/// Errors that can occur while reading or writing ledger state.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid value for key {key:?}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("invalid transaction timestamp: {0}")]
    Timestamp(String),

    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn StdError + Send + Sync>),
}

impl LedgerError {
    /// Wrap a storage failure, keeping it as the error source.
    pub fn backend(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        LedgerError::Backend(err.into())
    }
}

/// A commit that the backend refused to apply.
#[derive(Debug, Error)]
#[error("commit of transaction {tx_id} failed: {source}")]
pub struct CommitError {
    pub tx_id: String,
    #[source]
    pub source: LedgerError,
}

/// Coarse classification of a [`RecordError`], convenient for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    AlreadyExists,
    NotFound,
    NoOp,
    InvalidTransition,
    MalformedKey,
    Store,
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::NotFound => "not found",
            ErrorKind::NoOp => "no-op",
            ErrorKind::InvalidTransition => "invalid transition",
            ErrorKind::MalformedKey => "malformed key",
            ErrorKind::Store => "store error",
            ErrorKind::Serialization => "serialization error",
        };
        f.write_str(name)
    }
}

/// Errors returned to callers of the record stores.
///
/// Every variant carries the identifier the failed call was about.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid input for {id:?}: {reason}")]
    InvalidInput { id: String, reason: String },

    #[error("record {0} already exists")]
    AlreadyExists(String),

    #[error("record {0} does not exist")]
    NotFound(String),

    #[error("record {id} is already in status {status}")]
    NoOp { id: String, status: String },

    #[error("invalid transition for {id} from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("malformed key for {id:?}: {reason}")]
    MalformedKey { id: String, reason: String },

    #[error("ledger access failed for {id:?}: {source}")]
    Store {
        id: String,
        #[source]
        source: LedgerError,
    },

    #[error("failed to (de)serialize record {id}: {reason}")]
    Serialization { id: String, reason: String },
}

impl RecordError {
    pub fn invalid_input(id: impl Into<String>, reason: impl Into<String>) -> Self {
        RecordError::InvalidInput {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an accessor failure. Codec failures keep their meaning: an
    /// undecodable key is `MalformedKey`, an unencodable segment came from
    /// the caller and is `InvalidInput`.
    pub fn store(id: impl Into<String>, err: LedgerError) -> Self {
        let id = id.into();
        match err {
            LedgerError::Codec(CodecError::MalformedKey { key, reason }) => {
                RecordError::MalformedKey {
                    id,
                    reason: format!("{reason} (key {key:?})"),
                }
            }
            LedgerError::Codec(CodecError::InvalidSegment { segment, reason }) => {
                RecordError::InvalidInput {
                    id,
                    reason: format!("{segment:?} {reason}"),
                }
            }
            source => RecordError::Store { id, source },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordError::InvalidInput { .. } => ErrorKind::InvalidInput,
            RecordError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            RecordError::NotFound(_) => ErrorKind::NotFound,
            RecordError::NoOp { .. } => ErrorKind::NoOp,
            RecordError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            RecordError::MalformedKey { .. } => ErrorKind::MalformedKey,
            RecordError::Store { .. } => ErrorKind::Store,
            RecordError::Serialization { .. } => ErrorKind::Serialization,
        }
    }

    /// The identifier the failed call was about.
    pub fn id(&self) -> &str {
        match self {
            RecordError::AlreadyExists(id) | RecordError::NotFound(id) => id,
            RecordError::InvalidInput { id, .. }
            | RecordError::NoOp { id, .. }
            | RecordError::InvalidTransition { id, .. }
            | RecordError::MalformedKey { id, .. }
            | RecordError::Store { id, .. }
            | RecordError::Serialization { id, .. } => id,
        }
    }
}

impl From<CommitError> for RecordError {
    fn from(err: CommitError) -> Self {
        RecordError::store(err.tx_id, err.source)
    }
}
