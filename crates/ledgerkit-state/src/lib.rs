//! ledgerkit-state — durable world state for ledgerkit.
//!
//! Backed by [redb](https://docs.rs/redb), implements
//! [`ledgerkit_core::LedgerBackend`] so that the record stores can run on
//! persistent storage instead of the in-memory backend.
//!
//! # Architecture
//!
//! All ledger keys, simple and composite, live in a single `world_state`
//! table with `&str` keys and `&[u8]` values. Each committed transaction
//! becomes exactly one redb write transaction.
//!
//! The `RedbLedger` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across threads.

pub mod config;
pub mod error;
pub mod store;
pub mod tables;

pub use config::StoreConfig;
pub use error::{StateError, StateResult};
pub use store::RedbLedger;
