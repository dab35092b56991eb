//! Error types for the redb ledger backend.

use ledgerkit_core::LedgerError;
use thiserror::Error;

/// Result type alias for backend operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur inside the redb backend.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),
}

impl From<StateError> for LedgerError {
    fn from(err: StateError) -> Self {
        LedgerError::backend(err)
    }
}
