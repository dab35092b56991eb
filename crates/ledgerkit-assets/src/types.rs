//! Asset records as stored on the ledger.

use serde::{Deserialize, Serialize};

/// Unique identifier of an asset; also its primary ledger key.
pub type AssetId = String;

/// An asset owned by a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "assetID")]
    pub asset_id: AssetId,
    pub name: String,
    pub owner: String,
    pub value: i64,
}
