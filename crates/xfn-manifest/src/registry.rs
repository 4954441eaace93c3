//! Function registry - loading and lookup
//!
//! The registry file is a JSON document of the form
//! `{ "functions": [ { "name", "value", "uiFile", "scriptFile" } ] }`.
//! `value` is the stable function id used everywhere else; `uiFile` and
//! `scriptFile` are paths relative to the functions root. The registry is
//! deliberately re-read per invocation rather than cached, so a manifest
//! edited on disk between calls is picked up without a restart.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::ManifestError;

/// One external function declared in the manifest. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEntry {
    /// Human-readable display name
    pub name: String,
    /// Stable identifier, unique within one manifest
    pub value: String,
    /// UI-schema file, relative to the functions root
    #[serde(rename = "uiFile")]
    pub ui_file: String,
    /// Executable script, relative to the functions root
    #[serde(rename = "scriptFile")]
    pub script_file: String,
}

impl FunctionEntry {
    pub fn ui_schema_path(&self, root: &Path) -> PathBuf {
        root.join(&self.ui_file)
    }

    pub fn script_path(&self, root: &Path) -> PathBuf {
        root.join(&self.script_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
    functions: Vec<FunctionEntry>,
}

/// Loaded function manifest with an id index for O(1) lookup
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<FunctionEntry>,

    /// Runtime only - rebuilt on load
    index: AHashMap<String, usize>,
}

impl FunctionRegistry {
    /// Load the registry from a manifest file.
    ///
    /// An absent file is `ManifestError::Missing`; callers decide whether
    /// that is fatal (it is not at form-build time, it is at invocation
    /// time). Content that does not parse, or parses without a `functions`
    /// list, is `ManifestError::Malformed`.
    pub fn load_from_path(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::Missing {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let raw: RawManifest = serde_json::from_str(&content)?;

        let mut registry = FunctionRegistry {
            functions: raw.functions,
            index: AHashMap::new(),
        };
        registry.rebuild_index()?;

        debug!(
            "Loaded function manifest from {:?}: {} functions",
            path,
            registry.functions.len()
        );
        Ok(registry)
    }

    fn rebuild_index(&mut self) -> Result<(), ManifestError> {
        self.index.clear();
        for (idx, entry) in self.functions.iter().enumerate() {
            if self
                .index
                .insert(entry.value.clone(), idx)
                .is_some()
            {
                return Err(ManifestError::DuplicateFunction(entry.value.clone()));
            }
        }
        Ok(())
    }

    /// O(1) function lookup by id
    #[inline]
    pub fn get(&self, id: &str) -> Option<&FunctionEntry> {
        self.index.get(id).map(|&idx| &self.functions[idx])
    }

    pub fn functions(&self) -> &[FunctionEntry] {
        &self.functions
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
