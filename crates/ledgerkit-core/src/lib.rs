//! ledgerkit-core — the ledger capability shared by ledgerkit record stores.
//!
//! # Architecture
//!
//! Record stores never talk to storage directly. They are generic over
//! [`LedgerAccessor`], a per-transaction view offering point reads, range
//! and partial composite-key scans, buffered writes, a deterministic
//! transaction timestamp, and a single notification event.
//!
//! [`Transaction`] implements the accessor over any [`LedgerBackend`] and
//! commits its write set as one atomic batch. [`MemoryLedger`] is the
//! in-process backend; a durable redb backend lives in `ledgerkit-state`.
//!
//! Secondary indexes are built from composite keys (see [`codec`]), which
//! sort in their own keyspace below every simple key.

pub mod accessor;
pub mod backend;
pub mod batch;
pub mod codec;
pub mod error;
pub mod memory;
pub mod record;
pub mod transaction;

pub use accessor::{KeyValue, LedgerAccessor, LedgerEvent, StateIter, TxHeader, TxTimestamp};
pub use backend::LedgerBackend;
pub use batch::{WriteBatch, WriteOp};
pub use error::{
    CodecError, CommitError, ErrorKind, LedgerError, LedgerResult, RecordError, RecordResult,
};
pub use memory::MemoryLedger;
pub use transaction::{CommitReceipt, Ledger, Transaction};
