//! Per-item parameter resolution
//!
//! For the selected function's schema, reads the current value of each
//! declared parameter from the host. Values the host has not set are
//! skipped, not defaulted: with the JSON-parameter-file transport an absent
//! key is the script's signal to apply its own default, and injecting form
//! defaults here would hide that distinction from the script.

use serde_json::{Map, Value};
use tracing::trace;
use xfn_manifest::ParameterDescriptor;

use crate::host::HostContext;

/// Resolve the current values for `descriptors` on one item.
pub fn resolve_parameters(
    descriptors: &[ParameterDescriptor],
    host: &dyn HostContext,
    item_index: usize,
) -> Map<String, Value> {
    let mut resolved = Map::new();

    for descriptor in descriptors {
        match host.parameter_value(item_index, &descriptor.name) {
            Some(value) => {
                resolved.insert(descriptor.name.clone(), value);
            }
            None => {
                trace!(
                    parameter = %descriptor.name,
                    item = item_index,
                    "Parameter unset on item, skipping"
                );
            }
        }
    }

    resolved
}
