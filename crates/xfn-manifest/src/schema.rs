//! UI-schema loading and normalization
//!
//! Each function's UI schema is a JSON document of the form
//! `{ "properties": [ { "name", "type", "default"?, "displayOptions"?, ... } ] }`.
//! Unknown extra fields on a property are preserved verbatim and forwarded
//! untouched into the dynamic form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::ManifestError;
use crate::registry::FunctionEntry;
use std::path::Path;

/// Descriptor `kind` value that marks an explicit binary toggle. Paired
/// with `targetField` it replaces suffix-convention sniffing in the bridge.
pub const KIND_BINARY_TOGGLE: &str = "binary-toggle";

/// Display-time visibility conditions: the property is shown
/// only when, for every key in `show`, the current value of that key is one
/// of the listed values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplayOptions {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub show: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One input-parameter descriptor from a UI schema. Never mutated after
/// load; the form builder augments a clone with its own visibility
/// condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(
        rename = "displayOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_options: Option<DisplayOptions>,

    /// Explicit descriptor kind, e.g. `binary-toggle`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// For `binary-toggle` descriptors: the sibling parameter holding the
    /// attachment key
    #[serde(
        rename = "targetField",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub target_field: Option<String>,

    /// Anything else the schema author declared - passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParameterDescriptor {
    pub fn is_binary_toggle(&self) -> bool {
        self.kind.as_deref() == Some(KIND_BINARY_TOGGLE)
    }
}

#[derive(Debug, Deserialize)]
struct RawUiSchema {
    #[serde(default)]
    properties: Vec<Value>,
}

/// Load and normalize the UI schema for one function entry.
///
/// Raw properties lacking a `name` or `type` are skipped with a warning,
/// not a failure. A schema file that exists but cannot be parsed is
/// `ManifestError::SchemaUnreadable`; the caller decides whether that is
/// fatal (it is at invocation time for the selected function, it is not at
/// form-build time).
pub fn load_ui_schema(
    entry: &FunctionEntry,
    root: &Path,
) -> Result<Vec<ParameterDescriptor>, ManifestError> {
    let path = entry.ui_schema_path(root);
    let content = std::fs::read_to_string(&path).map_err(|e| ManifestError::SchemaUnreadable {
        function: entry.value.clone(),
        reason: format!("{}: {e}", path.display()),
    })?;

    let raw: RawUiSchema =
        serde_json::from_str(&content).map_err(|e| ManifestError::SchemaUnreadable {
            function: entry.value.clone(),
            reason: e.to_string(),
        })?;

    let mut descriptors = Vec::with_capacity(raw.properties.len());
    for prop in raw.properties {
        let has_name = prop.get("name").and_then(Value::as_str).is_some();
        let has_type = prop.get("type").and_then(Value::as_str).is_some();
        if !has_name || !has_type {
            warn!(
                function = %entry.value,
                "Skipping schema property without name or type: {prop}"
            );
            continue;
        }

        match serde_json::from_value::<ParameterDescriptor>(prop) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => {
                warn!(function = %entry.value, "Skipping unparseable schema property: {e}");
            }
        }
    }

    Ok(descriptors)
}
