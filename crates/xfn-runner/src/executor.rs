//! Batch execution
//!
//! [`Dispatcher`] ties the pipeline together: per input item it re-reads
//! the manifest, resolves the selected function's parameters, bridges
//! binary attachments through transient files, invokes the script and
//! decodes the result into exactly one output record. Items are processed
//! strictly in order; a failing item either becomes an error record or
//! aborts the remainder, per the host's continue-on-failure policy.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use xfn_manifest::{load_ui_schema, FunctionRegistry};

use crate::bridge::{bridge_in, bridge_out, ArtifactGuard};
use crate::decode::decode;
use crate::errors::{DispatchError, Result};
use crate::form::FormRegistry;
use crate::host::{HostContext, OutputRecord};
use crate::invoke::{Invoker, DEFAULT_TIMEOUT};
use crate::resolve::resolve_parameters;

/// Dispatcher settings. `manifest_path` and schema/script paths resolve
/// against `functions_root`; `work_dir` holds the transient artifacts.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub functions_root: PathBuf,
    pub manifest_path: PathBuf,
    pub work_dir: PathBuf,
    pub timeout: Duration,
    pub interpreter: Option<String>,
}

impl DispatcherConfig {
    pub fn new(functions_root: impl Into<PathBuf>) -> Self {
        let functions_root = functions_root.into();
        let manifest_path = functions_root.join("functions.json");
        DispatcherConfig {
            functions_root,
            manifest_path,
            work_dir: std::env::temp_dir(),
            timeout: DEFAULT_TIMEOUT,
            interpreter: None,
        }
    }
}

/// Manifest-driven dispatch to external function scripts.
pub struct Dispatcher {
    config: DispatcherConfig,
    invoker: Invoker,
    form: FormRegistry,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let invoker = Invoker::new(config.timeout, config.interpreter.clone());
        Dispatcher {
            config,
            invoker,
            form: FormRegistry::new(),
        }
    }

    /// Build the dynamic form. Must complete before `run` accepts
    /// invocations; load problems degrade to an empty or partial form.
    pub fn initialize(&mut self) -> usize {
        self.form
            .build(&self.config.manifest_path, &self.config.functions_root)
    }

    pub fn form(&self) -> &FormRegistry {
        &self.form
    }

    /// Execute `function_id` over every item of the host, in order.
    ///
    /// With continue-on-failure set the returned vector always has one
    /// record per input item, failed items marked as error records;
    /// otherwise the first failure aborts and is returned as the error.
    pub fn run(&self, function_id: &str, host: &dyn HostContext) -> Result<Vec<OutputRecord>> {
        if !self.form.is_ready() {
            return Err(DispatchError::FormNotReady);
        }

        info!(
            function = function_id,
            items = host.item_count(),
            "Dispatching batch"
        );

        let mut records = Vec::with_capacity(host.item_count());
        for item_index in 0..host.item_count() {
            match self.process_item(function_id, host, item_index) {
                Ok(record) => records.push(record),
                Err(e) => {
                    if host.continue_on_failure() {
                        debug!(item = item_index, "Item failed, continuing: {e}");
                        records.push(OutputRecord::failure(
                            &format!("{function_id}: {e}"),
                            item_index,
                        ));
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Ok(records)
    }

    /// One invocation attempt. The manifest is re-read here so a registry
    /// edited on disk is picked up without a restart; transient artifacts
    /// are scoped to this attempt and removed when the guard drops, on
    /// every exit path.
    fn process_item(
        &self,
        function_id: &str,
        host: &dyn HostContext,
        item_index: usize,
    ) -> Result<OutputRecord> {
        let registry = FunctionRegistry::load_from_path(&self.config.manifest_path)?;
        let entry = registry
            .get(function_id)
            .ok_or_else(|| DispatchError::FunctionNotFound(function_id.to_string()))?;

        let descriptors = load_ui_schema(entry, &self.config.functions_root)?;

        let script = entry.script_path(&self.config.functions_root);
        if !script.exists() {
            return Err(DispatchError::ScriptNotFound {
                function: function_id.to_string(),
                path: script,
            });
        }

        let mut guard = ArtifactGuard::new();
        let mut params = resolve_parameters(&descriptors, host, item_index);
        bridge_in(
            &mut params,
            &descriptors,
            host,
            item_index,
            &self.config.work_dir,
            &mut guard,
        )?;

        let stdout = self
            .invoker
            .invoke(&script, &params, &self.config.work_dir, item_index, &mut guard)?;

        let result = decode(&stdout)?;
        Ok(bridge_out(result, item_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BinaryAttachment;
    use serde_json::Value;
    use tempfile::TempDir;

    struct EmptyHost {
        items: usize,
        continue_on_failure: bool,
    }

    impl HostContext for EmptyHost {
        fn item_count(&self) -> usize {
            self.items
        }

        fn parameter_value(&self, _item: usize, _name: &str) -> Option<Value> {
            None
        }

        fn binary_attachment(&self, _item: usize, _name: &str) -> Option<BinaryAttachment> {
            None
        }

        fn continue_on_failure(&self) -> bool {
            self.continue_on_failure
        }
    }

    #[test]
    fn test_run_refused_before_initialize() {
        let dir = TempDir::new().unwrap();
        let dispatcher = Dispatcher::new(DispatcherConfig::new(dir.path()));
        let host = EmptyHost {
            items: 1,
            continue_on_failure: true,
        };
        assert!(matches!(
            dispatcher.run("anything", &host),
            Err(DispatchError::FormNotReady)
        ));
    }

    #[test]
    fn test_missing_manifest_fails_every_item() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = Dispatcher::new(DispatcherConfig::new(dir.path()));
        assert_eq!(dispatcher.initialize(), 0);

        let host = EmptyHost {
            items: 2,
            continue_on_failure: true,
        };
        let records = dispatcher.run("file_trimming", &host).unwrap();
        assert_eq!(records.len(), 2);
        for (idx, record) in records.iter().enumerate() {
            assert!(record.error);
            assert_eq!(record.paired_item, idx);
            let message = record.json["error"].as_str().unwrap();
            assert!(message.contains("manifest not found"), "got: {message}");
        }
    }

    #[test]
    fn test_missing_manifest_aborts_without_continue() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = Dispatcher::new(DispatcherConfig::new(dir.path()));
        dispatcher.initialize();

        let host = EmptyHost {
            items: 2,
            continue_on_failure: false,
        };
        assert!(dispatcher.run("file_trimming", &host).is_err());
    }
}
