//! Dynamic form registry
//!
//! At initialization the registry walks every manifest entry, loads its UI
//! schema and registers each parameter descriptor tagged with a visibility
//! condition keyed to "this function is selected". Building is an explicit
//! step with an explicit ready state; the dispatcher refuses invocations
//! until `build` has completed rather than racing a background task.

use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use ahash::AHashMap;
use xfn_manifest::{load_ui_schema, FunctionRegistry, ParameterDescriptor};

/// Form key the selected-function condition is registered under.
pub const SELECTED_FUNCTION_KEY: &str = "selectedFunction";

/// One registered form property: a parameter descriptor owned by a
/// function, with the merged visibility condition applied.
#[derive(Debug, Clone)]
pub struct FormProperty {
    pub function_id: String,
    pub descriptor: ParameterDescriptor,
}

/// The global property registry backing the host's input form.
///
/// Rebuilding replaces keyed by `(function_id, parameter_name)`, so
/// repeated builds never append duplicates.
#[derive(Debug, Default)]
pub struct FormRegistry {
    properties: Vec<FormProperty>,
    index: AHashMap<(String, String), usize>,
    ready: bool,
}

impl FormRegistry {
    pub fn new() -> Self {
        FormRegistry::default()
    }

    /// Whether `build` has completed since construction.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Build the form from the manifest at `manifest_path`, resolving
    /// schema files against `root`. Returns the number of registered
    /// properties.
    ///
    /// Load problems degrade gracefully here: a missing or malformed
    /// manifest leaves the form empty, one function's unreadable schema
    /// omits only that function's fields. Both are logged, neither fails
    /// the build.
    pub fn build(&mut self, manifest_path: &Path, root: &Path) -> usize {
        let registry = match FunctionRegistry::load_from_path(manifest_path) {
            Ok(registry) => registry,
            Err(e) => {
                warn!("No dynamic properties registered: {e}");
                self.ready = true;
                return 0;
            }
        };

        for entry in registry.functions() {
            let descriptors = match load_ui_schema(entry, root) {
                Ok(descriptors) => descriptors,
                Err(e) => {
                    warn!(function = %entry.value, "Omitting fields for function: {e}");
                    continue;
                }
            };

            for descriptor in descriptors {
                self.register(&entry.value, descriptor);
            }
        }

        self.ready = true;
        debug!("Form registry built: {} properties", self.properties.len());
        self.properties.len()
    }

    fn register(&mut self, function_id: &str, mut descriptor: ParameterDescriptor) {
        merge_visibility(&mut descriptor, function_id);

        let key = (function_id.to_string(), descriptor.name.clone());
        let property = FormProperty {
            function_id: function_id.to_string(),
            descriptor,
        };

        match self.index.get(&key) {
            Some(&idx) => self.properties[idx] = property,
            None => {
                self.index.insert(key, self.properties.len());
                self.properties.push(property);
            }
        }
    }

    pub fn properties(&self) -> &[FormProperty] {
        &self.properties
    }

    /// Properties shown when `function_id` is the selected function.
    pub fn visible_for(&self, function_id: &str) -> Vec<&FormProperty> {
        self.properties
            .iter()
            .filter(|p| {
                p.descriptor
                    .display_options
                    .as_ref()
                    .and_then(|d| d.show.get(SELECTED_FUNCTION_KEY))
                    .and_then(Value::as_array)
                    .is_some_and(|ids| ids.iter().any(|v| v.as_str() == Some(function_id)))
            })
            .collect()
    }
}

/// Intersect the descriptor's visibility with "selected function == id".
///
/// Pre-existing `show` conditions are narrowing constraints and must
/// survive the merge; a pre-existing selected-function list is intersected
/// rather than overwritten.
fn merge_visibility(descriptor: &mut ParameterDescriptor, function_id: &str) {
    let options = descriptor.display_options.get_or_insert_with(Default::default);

    let merged = match options.show.get(SELECTED_FUNCTION_KEY) {
        Some(Value::Array(existing)) => Value::Array(
            existing
                .iter()
                .filter(|v| v.as_str() == Some(function_id))
                .cloned()
                .collect(),
        ),
        _ => Value::Array(vec![Value::from(function_id)]),
    };
    options
        .show
        .insert(SELECTED_FUNCTION_KEY.to_string(), merged);
}
