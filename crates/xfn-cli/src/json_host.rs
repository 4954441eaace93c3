//! File-backed host context
//!
//! Reads a batch of input items from a JSON file:
//! `{ "continueOnFailure": bool, "items": [ { "parameters": {...},
//! "binary": { "<key>": { "data": "<base64>", "fileName": "..." } } } ] }`.

use anyhow::Context;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

use xfn_runner::{BinaryAttachment, HostContext};

#[derive(Debug, Deserialize)]
struct RawAttachment {
    data: String,
    #[serde(rename = "fileName")]
    file_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawItem {
    #[serde(default)]
    parameters: Map<String, Value>,
    #[serde(default)]
    binary: HashMap<String, RawAttachment>,
}

#[derive(Debug, Default, Deserialize)]
struct RawItemsFile {
    #[serde(default, rename = "continueOnFailure")]
    continue_on_failure: bool,
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug)]
struct Item {
    parameters: Map<String, Value>,
    binary: HashMap<String, BinaryAttachment>,
}

/// Host context loaded from an items file.
#[derive(Debug)]
pub struct JsonHost {
    continue_on_failure: bool,
    items: Vec<Item>,
}

impl JsonHost {
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read items file {}", path.display()))?;
        let raw: RawItemsFile = serde_json::from_str(&content)
            .with_context(|| format!("cannot parse items file {}", path.display()))?;

        let mut items = Vec::with_capacity(raw.items.len());
        for (index, raw_item) in raw.items.into_iter().enumerate() {
            let mut binary = HashMap::new();
            for (key, attachment) in raw_item.binary {
                let data = general_purpose::STANDARD
                    .decode(attachment.data.as_bytes())
                    .with_context(|| {
                        format!("attachment '{key}' on item {index} is not valid base64")
                    })?;
                binary.insert(
                    key,
                    BinaryAttachment {
                        data,
                        file_name: attachment.file_name,
                    },
                );
            }
            items.push(Item {
                parameters: raw_item.parameters,
                binary,
            });
        }

        Ok(JsonHost {
            continue_on_failure: raw.continue_on_failure,
            items,
        })
    }
}

impl HostContext for JsonHost {
    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn parameter_value(&self, item: usize, name: &str) -> Option<Value> {
        self.items.get(item)?.parameters.get(name).cloned()
    }

    fn binary_attachment(&self, item: usize, name: &str) -> Option<BinaryAttachment> {
        self.items.get(item)?.binary.get(name).cloned()
    }

    fn continue_on_failure(&self) -> bool {
        self.continue_on_failure
    }
}
