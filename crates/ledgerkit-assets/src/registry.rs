//! AssetRegistry — asset records plus their owner index.
//!
//! Every asset is stored twice: the JSON record under its own ID, and an
//! empty marker under the composite key `owner~assetID / owner / id`. The
//! two are always written, and removed, in the same batch.

use ledgerkit_core::record::{
    decode_record, encode_record, require_non_empty, require_simple_key,
};
use ledgerkit_core::{LedgerAccessor, RecordError, RecordResult, WriteBatch, WriteOp};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::types::Asset;

/// Composite-key namespace of the owner index.
pub const OWNER_INDEX: &str = "owner~assetID";

/// Value stored under every index key; presence is all that matters.
const INDEX_MARKER: [u8; 1] = [0];

pub const EVENT_ASSET_CREATED: &str = "AssetCreated";
pub const EVENT_ASSET_UPDATED: &str = "AssetUpdated";
pub const EVENT_ASSET_DELETED: &str = "AssetDeleted";

/// What `update_asset` does with the owner index when the owner changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerChangePolicy {
    /// Leave the index entry under the previous owner. Queries by the new
    /// owner will not see the asset; queries by the old owner still will.
    #[default]
    KeepIndex,
    /// Move the index entry to the new owner in the same batch.
    Reindex,
}

enum IndexChange {
    Insert,
    Remove,
}

/// Entity store for assets.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    owner_change: OwnerChangePolicy,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(owner_change: OwnerChangePolicy) -> Self {
        Self { owner_change }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::with_policy(config.owner_change)
    }

    pub fn owner_change_policy(&self) -> OwnerChangePolicy {
        self.owner_change
    }

    /// Register a new asset and its owner index entry.
    ///
    /// `value` is the decimal text of a signed 64-bit integer.
    pub fn create_asset<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &mut L,
        asset_id: &str,
        name: &str,
        owner: &str,
        value: &str,
    ) -> RecordResult<Asset> {
        require_simple_key(asset_id, "asset ID")?;
        require_non_empty(asset_id, "name", name)?;
        require_non_empty(asset_id, "owner", owner)?;
        require_non_empty(asset_id, "value", value)?;
        let value = parse_value(asset_id, value)?;

        if self.asset_exists(ledger, asset_id)? {
            return Err(RecordError::AlreadyExists(asset_id.to_string()));
        }

        let asset = Asset {
            asset_id: asset_id.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            value,
        };
        let bytes = encode_record(asset_id, &asset)?;

        let mut batch = WriteBatch::new().put(asset_id, bytes.clone());
        batch.push(index_op(ledger, IndexChange::Insert, owner, asset_id)?);
        ledger
            .apply_writes(batch)
            .map_err(|e| RecordError::store(asset_id, e))?;
        ledger
            .set_event(EVENT_ASSET_CREATED, bytes)
            .map_err(|e| RecordError::store(asset_id, e))?;

        debug!(asset_id, owner, "asset created");
        Ok(asset)
    }

    /// Fetch an asset by ID.
    pub fn read_asset<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
        asset_id: &str,
    ) -> RecordResult<Asset> {
        require_simple_key(asset_id, "asset ID")?;
        let bytes = ledger
            .get_state(asset_id)
            .map_err(|e| RecordError::store(asset_id, e))?
            .ok_or_else(|| RecordError::NotFound(asset_id.to_string()))?;
        decode_record(asset_id, &bytes)
    }

    /// Overwrite every field of an existing asset except its ID.
    pub fn update_asset<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &mut L,
        asset_id: &str,
        name: &str,
        owner: &str,
        value: &str,
    ) -> RecordResult<Asset> {
        let existing = self.read_asset(ledger, asset_id)?;
        let value = parse_value(asset_id, value)?;

        let asset = Asset {
            asset_id: asset_id.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            value,
        };
        let bytes = encode_record(asset_id, &asset)?;

        let mut batch = WriteBatch::new().put(asset_id, bytes.clone());
        if existing.owner != owner {
            match self.owner_change {
                OwnerChangePolicy::Reindex => {
                    batch.push(index_op(ledger, IndexChange::Remove, &existing.owner, asset_id)?);
                    batch.push(index_op(ledger, IndexChange::Insert, owner, asset_id)?);
                    debug!(asset_id, from = %existing.owner, to = owner, "owner index moved");
                }
                OwnerChangePolicy::KeepIndex => {
                    warn!(
                        asset_id,
                        from = %existing.owner,
                        to = owner,
                        "owner changed; index entry left under previous owner"
                    );
                }
            }
        }
        ledger
            .apply_writes(batch)
            .map_err(|e| RecordError::store(asset_id, e))?;
        ledger
            .set_event(EVENT_ASSET_UPDATED, bytes)
            .map_err(|e| RecordError::store(asset_id, e))?;

        debug!(asset_id, "asset updated");
        Ok(asset)
    }

    /// Remove an asset and the index entry under its current owner.
    pub fn delete_asset<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &mut L,
        asset_id: &str,
    ) -> RecordResult<()> {
        let existing = self.read_asset(ledger, asset_id)?;

        let mut batch = WriteBatch::new().delete(asset_id);
        batch.push(index_op(ledger, IndexChange::Remove, &existing.owner, asset_id)?);
        ledger
            .apply_writes(batch)
            .map_err(|e| RecordError::store(asset_id, e))?;
        ledger
            .set_event(EVENT_ASSET_DELETED, asset_id.as_bytes().to_vec())
            .map_err(|e| RecordError::store(asset_id, e))?;

        debug!(asset_id, owner = %existing.owner, "asset deleted");
        Ok(())
    }

    pub fn asset_exists<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
        asset_id: &str,
    ) -> RecordResult<bool> {
        require_simple_key(asset_id, "asset ID")?;
        let bytes = ledger
            .get_state(asset_id)
            .map_err(|e| RecordError::store(asset_id, e))?;
        Ok(bytes.is_some())
    }

    /// All assets indexed under `owner`, in ascending asset-ID order.
    ///
    /// Fails if any index entry points at a missing or unreadable record.
    pub fn query_assets_by_owner<L: LedgerAccessor + ?Sized>(
        &self,
        ledger: &L,
        owner: &str,
    ) -> RecordResult<Vec<Asset>> {
        let entries = ledger
            .state_by_partial_composite_key(OWNER_INDEX, &[owner])
            .map_err(|e| RecordError::store(owner, e))?;

        let mut assets = Vec::new();
        for entry in entries {
            let (key, _) = entry.map_err(|e| RecordError::store(owner, e))?;
            let (_, segments) = ledger
                .split_composite_key(&key)
                .map_err(|e| RecordError::store(owner, e))?;
            let asset_id = segments.get(1).ok_or_else(|| RecordError::MalformedKey {
                id: owner.to_string(),
                reason: format!("index key {key:?} has no asset segment"),
            })?;
            assets.push(self.read_asset(ledger, asset_id)?);
        }
        Ok(assets)
    }
}

/// The single place index writes are produced.
fn index_op<L: LedgerAccessor + ?Sized>(
    ledger: &L,
    change: IndexChange,
    owner: &str,
    asset_id: &str,
) -> RecordResult<WriteOp> {
    let key = ledger
        .create_composite_key(OWNER_INDEX, &[owner, asset_id])
        .map_err(|e| RecordError::store(asset_id, e))?;
    Ok(match change {
        IndexChange::Insert => WriteOp::put(key, INDEX_MARKER.to_vec()),
        IndexChange::Remove => WriteOp::delete(key),
    })
}

fn parse_value(asset_id: &str, value: &str) -> RecordResult<i64> {
    value
        .parse::<i64>()
        .map_err(|_| RecordError::invalid_input(asset_id, format!("value {value:?} must be a valid integer")))
}
