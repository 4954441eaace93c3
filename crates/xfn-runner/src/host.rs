//! Host collaborator interface
//!
//! The runner is agnostic to where items come from; anything that can
//! answer per-item parameter and binary-attachment lookups can drive it.

use base64::{engine::general_purpose, Engine as _};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Fixed attachment key under which binary results are registered on the
/// output record.
pub const OUTPUT_BINARY_KEY: &str = "data";

/// Per-item data supplier and batch policy source.
pub trait HostContext {
    /// Number of input items in the batch
    fn item_count(&self) -> usize;

    /// Current value of a named parameter for one item, if set
    fn parameter_value(&self, item: usize, name: &str) -> Option<Value>;

    /// Binary attachment registered under `name` for one item, if any
    fn binary_attachment(&self, item: usize, name: &str) -> Option<BinaryAttachment>;

    /// Whether a failing item is recorded and the batch continues, or the
    /// first failure aborts the remainder. Read once per item.
    fn continue_on_failure(&self) -> bool;
}

/// An in-memory binary buffer plus its original filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryAttachment {
    pub data: Vec<u8>,
    pub file_name: String,
}

/// Binary payload carried on an output record.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BinaryOutput {
    pub key: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(serialize_with = "serialize_base64")]
    pub data: Vec<u8>,
}

/// One output record, correlated 1:1 with its input item.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    pub json: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<BinaryOutput>,

    #[serde(rename = "pairedItem")]
    pub paired_item: usize,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
}

impl OutputRecord {
    pub fn success(json: Value, paired_item: usize) -> Self {
        OutputRecord {
            json,
            binary: None,
            paired_item,
            error: false,
        }
    }

    pub fn with_binary(json: Value, attachment: BinaryAttachment, paired_item: usize) -> Self {
        OutputRecord {
            json,
            binary: Some(BinaryOutput {
                key: OUTPUT_BINARY_KEY.to_string(),
                file_name: attachment.file_name,
                data: attachment.data,
            }),
            paired_item,
            error: false,
        }
    }

    pub fn failure(message: &str, paired_item: usize) -> Self {
        OutputRecord {
            json: serde_json::json!({ "error": message }),
            binary: None,
            paired_item,
            error: true,
        }
    }
}

fn serialize_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&general_purpose::STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_record_shape() {
        let record = OutputRecord::failure("it broke", 2);
        assert!(record.error);
        assert_eq!(record.paired_item, 2);
        assert_eq!(record.json, serde_json::json!({"error": "it broke"}));
    }

    #[test]
    fn test_binary_record_serializes_base64() {
        let record = OutputRecord::with_binary(
            serde_json::json!({}),
            BinaryAttachment {
                data: b"abc".to_vec(),
                file_name: "x.bin".to_string(),
            },
            0,
        );
        let serialized = serde_json::to_value(&record).unwrap();
        assert_eq!(serialized["binary"]["data"], "YWJj");
        assert_eq!(serialized["binary"]["fileName"], "x.bin");
        assert_eq!(serialized["binary"]["key"], OUTPUT_BINARY_KEY);
        assert_eq!(serialized["pairedItem"], 0);
        assert!(serialized.get("error").is_none());
    }
}
