//! ledgerkit-assets — asset registry with a secondary owner index.
//!
//! Assets are JSON records keyed by asset ID. Each one also has an entry in
//! the `owner~assetID` composite index so that all assets of an owner can
//! be listed with a single prefix scan. Creating or deleting an asset
//! writes the record and its index entry in the same batch.
//!
//! All operations take any [`ledgerkit_core::LedgerAccessor`], so the
//! registry runs unchanged on the in-memory and the redb backends.
//!
//! ```rust,no_run
//! use ledgerkit_assets::AssetRegistry;
//! use ledgerkit_core::{Ledger, MemoryLedger, RecordError, TxHeader, TxTimestamp};
//!
//! fn main() -> Result<(), RecordError> {
//!     let ledger = Ledger::new(MemoryLedger::new());
//!     let registry = AssetRegistry::new();
//!     let header = TxHeader::new("tx-1", TxTimestamp::new(1_700_000_000, 0));
//!
//!     ledger.submit(header, |tx| {
//!         registry.create_asset(tx, "A1", "Widget", "alice", "100")
//!     })?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod registry;
pub mod types;

pub use config::RegistryConfig;
pub use registry::{
    AssetRegistry, EVENT_ASSET_CREATED, EVENT_ASSET_DELETED, EVENT_ASSET_UPDATED, OWNER_INDEX,
    OwnerChangePolicy,
};
pub use types::{Asset, AssetId};
