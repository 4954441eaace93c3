//! Result decoding
//!
//! Scripts emit either a single JSON object on stdout or arbitrary text.
//! Non-JSON output is not an error: it is wrapped in a defined text
//! fallback. A JSON object carrying both `binary_data` (base64) and
//! `file_name` is classified as a binary result.

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};
use tracing::trace;

use crate::errors::{DispatchError, Result};

/// Field names of the external binary-result contract.
pub const BINARY_DATA_FIELD: &str = "binary_data";
pub const FILE_NAME_FIELD: &str = "file_name";

/// Decoded script output, consumed immediately to build the output record.
#[derive(Debug, PartialEq)]
pub enum ExternalResult {
    /// Parsed JSON, forwarded verbatim as the record body
    Json(Value),
    /// stdout was not JSON; the trimmed raw text
    TextFallback(String),
    /// JSON carrying a binary payload; `body` is the object minus the
    /// payload fields
    Binary {
        body: Map<String, Value>,
        data: Vec<u8>,
        file_name: String,
    },
}

/// Decode raw stdout into an [`ExternalResult`].
pub fn decode(stdout: &str) -> Result<ExternalResult> {
    let trimmed = stdout.trim();

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        trace!("stdout is not JSON, using text fallback");
        return Ok(ExternalResult::TextFallback(trimmed.to_string()));
    };

    let Value::Object(mut object) = value else {
        return Ok(ExternalResult::Json(value));
    };

    let is_binary = object.get(BINARY_DATA_FIELD).is_some_and(Value::is_string)
        && object.get(FILE_NAME_FIELD).is_some_and(Value::is_string);
    if !is_binary {
        return Ok(ExternalResult::Json(Value::Object(object)));
    }

    let encoded = match object.remove(BINARY_DATA_FIELD) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };
    let file_name = match object.remove(FILE_NAME_FIELD) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    let data = general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| DispatchError::MalformedBinaryResult(e.to_string()))?;

    Ok(ExternalResult::Binary {
        body: object,
        data,
        file_name,
    })
}
