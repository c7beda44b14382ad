use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::adapter::AdapterError;

/// The response framing every remote call answers with.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// Accepts whatever the transport handed back; anything that does not
    /// parse as an envelope counts as a failed call.
    pub fn parse(raw: Value) -> Self {
        serde_json::from_value(raw)
            .unwrap_or(Envelope { success: false, data: None, error: None })
    }

    pub fn into_data(self) -> Result<Value, AdapterError> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(AdapterError::Remote(
                self.error.unwrap_or_else(|| "remote call failed".to_string()),
            ))
        }
    }
}

/// Reduces a duck-typed list response to one typed sequence. The store
/// answers list reads either with a bare array or with an object wrapping a
/// `data` array; both are accepted here and the ambiguity goes no further.
/// Rows that do not parse are skipped rather than discarding the batch.
pub fn rows<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(row) => Some(row),
            Err(err) => {
                warn!(%err, "skipping malformed row");
                None
            }
        })
        .collect()
}
