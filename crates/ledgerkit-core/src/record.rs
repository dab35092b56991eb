//! Helpers shared by the record stores: JSON payloads and input checks.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::error::{RecordError, RecordResult};

/// Serialize a record for storage under `id`.
pub fn encode_record<T: Serialize>(id: &str, record: &T) -> RecordResult<Vec<u8>> {
    serde_json::to_vec(record).map_err(|e| RecordError::Serialization {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Deserialize a record stored under `id`.
pub fn decode_record<T: DeserializeOwned>(id: &str, bytes: &[u8]) -> RecordResult<T> {
    serde_json::from_slice(bytes).map_err(|e| RecordError::Serialization {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Reject an empty caller-supplied field.
pub fn require_non_empty(id: &str, field: &str, value: &str) -> RecordResult<()> {
    if value.is_empty() {
        return Err(RecordError::invalid_input(
            id,
            format!("{field} cannot be empty"),
        ));
    }
    Ok(())
}

/// Reject an identifier that cannot be a simple ledger key: empty, or
/// starting with the composite-key separator.
pub fn require_simple_key(id: &str, field: &str) -> RecordResult<()> {
    require_non_empty(id, field, id)?;
    if codec::is_composite(id) {
        return Err(RecordError::invalid_input(
            id,
            format!("{field} cannot start with U+0000"),
        ));
    }
    Ok(())
}
