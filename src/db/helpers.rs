use crate::store::{Item, StoreError};

pub fn encode_item(item: &Item) -> Result<String, StoreError> {
    serde_json::to_string(item).map_err(|err| StoreError::Unavailable(format!(
        "failed to encode item attributes: {err}"
    )))
}

pub fn decode_item(key: &str, raw: &str) -> Result<Item, StoreError> {
    serde_json::from_str(raw).map_err(|err| StoreError::CorruptItem {
        key: key.to_string(),
        reason: err.to_string(),
    })
}
