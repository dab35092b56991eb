//! Product records as stored on the ledger.

use serde::{Deserialize, Serialize};

/// Unique identifier of a product; also its ledger key.
pub type ProductId = String;

/// One step of a product's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: String,
    /// Transaction time of the step, RFC 3339 in UTC.
    pub timestamp: String,
}

/// A tracked product and its full status history.
///
/// `status_history` is never empty and its last entry always carries
/// `current_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "productID")]
    pub product_id: ProductId,
    pub current_status: String,
    pub status_history: Vec<StatusEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_field_names() {
        let product = Product {
            product_id: "P1".to_string(),
            current_status: "Manufactured".to_string(),
            status_history: vec![StatusEntry {
                status: "Manufactured".to_string(),
                timestamp: "2024-03-01T12:00:00Z".to_string(),
            }],
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "productID": "P1",
                "currentStatus": "Manufactured",
                "statusHistory": [
                    {"status": "Manufactured", "timestamp": "2024-03-01T12:00:00Z"}
                ]
            })
        );
    }
}
