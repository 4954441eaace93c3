//! Binary bridge
//!
//! External scripts only accept file paths, not in-memory buffers. The
//! input side detects binary-toggle parameters, materializes the referenced
//! attachment to a uniquely-named transient file and substitutes the file
//! path into the parameter set. The output side turns a decoded base64
//! payload back into an output-record attachment.
//!
//! Detection honors an explicit `kind: "binary-toggle"` descriptor first
//! and falls back to the `...IsBinary` / `...BinaryPropertyName` suffix
//! convention. A sibling `...UseFilePath` toggle set to true means the
//! script reads a caller-supplied path directly and no attachment is
//! materialized.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use xfn_manifest::ParameterDescriptor;

use crate::decode::ExternalResult;
use crate::errors::{DispatchError, Result};
use crate::host::{BinaryAttachment, HostContext, OutputRecord};

pub const BINARY_TOGGLE_SUFFIX: &str = "IsBinary";
pub const BINARY_PROPERTY_SUFFIX: &str = "BinaryPropertyName";
pub const USE_FILE_PATH_SUFFIX: &str = "UseFilePath";

static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Tracks transient files for one invocation attempt and deletes them when
/// dropped. Deletion is best-effort: failures are logged, never escalated.
#[derive(Debug, Default)]
pub struct ArtifactGuard {
    paths: Vec<PathBuf>,
}

impl ArtifactGuard {
    pub fn new() -> Self {
        ArtifactGuard::default()
    }

    pub fn track(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed transient artifact {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove transient artifact {:?}: {e}", path),
            }
        }
    }
}

/// Collision-free artifact path: pid, wall-clock nanos, item index and a
/// process-wide sequence counter, so concurrent runs and repeated
/// invocations of the same item never collide.
pub fn unique_artifact_path(work_dir: &Path, item_index: usize, file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
    work_dir.join(format!(
        "xfn-{}-{nanos}-{item_index}-{seq}-{file_name}",
        std::process::id()
    ))
}

/// A detected toggle/target parameter pair.
struct TogglePair {
    toggle: String,
    target: String,
}

impl TogglePair {
    /// Name of the sibling pass-through toggle, when derivable.
    fn use_file_path_key(&self) -> Option<String> {
        self.toggle
            .strip_suffix(BINARY_TOGGLE_SUFFIX)
            .or_else(|| self.target.strip_suffix(BINARY_PROPERTY_SUFFIX))
            .map(|base| format!("{base}{USE_FILE_PATH_SUFFIX}"))
    }
}

fn detect_pairs(params: &Map<String, Value>, descriptors: &[ParameterDescriptor]) -> Vec<TogglePair> {
    let mut pairs: Vec<TogglePair> = Vec::new();

    // Explicit descriptor marking wins over suffix sniffing
    for descriptor in descriptors {
        if descriptor.is_binary_toggle() {
            if let Some(target) = &descriptor.target_field {
                pairs.push(TogglePair {
                    toggle: descriptor.name.clone(),
                    target: target.clone(),
                });
            } else {
                warn!(
                    parameter = %descriptor.name,
                    "binary-toggle descriptor without targetField, ignoring"
                );
            }
        }
    }

    for name in params.keys() {
        if let Some(base) = name.strip_suffix(BINARY_TOGGLE_SUFFIX) {
            if pairs.iter().any(|p| p.toggle == *name) {
                continue;
            }
            pairs.push(TogglePair {
                toggle: name.clone(),
                target: format!("{base}{BINARY_PROPERTY_SUFFIX}"),
            });
        }
    }

    pairs
}

/// Input side: substitute attachment bytes with transient file paths.
///
/// Every file created is tracked on `guard`; the caller keeps the guard
/// alive until the invocation attempt is over and cleanup happens on drop,
/// on every exit path.
pub fn bridge_in(
    params: &mut Map<String, Value>,
    descriptors: &[ParameterDescriptor],
    host: &dyn HostContext,
    item_index: usize,
    work_dir: &Path,
    guard: &mut ArtifactGuard,
) -> Result<()> {
    for pair in detect_pairs(params, descriptors) {
        if params.get(&pair.toggle).and_then(Value::as_bool) != Some(true) {
            continue;
        }

        // Caller supplied a real path; the script reads it directly
        let passthrough = pair
            .use_file_path_key()
            .and_then(|key| params.get(&key).and_then(Value::as_bool))
            == Some(true);
        if passthrough {
            continue;
        }

        let attachment_key = params
            .get(&pair.target)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| DispatchError::BinaryAttachmentMissing {
                property: pair.target.clone(),
                item: item_index,
            })?;

        let attachment = host
            .binary_attachment(item_index, &attachment_key)
            .ok_or_else(|| DispatchError::BinaryAttachmentMissing {
                property: attachment_key.clone(),
                item: item_index,
            })?;

        std::fs::create_dir_all(work_dir)?;
        let artifact = unique_artifact_path(work_dir, item_index, &attachment.file_name);
        std::fs::write(&artifact, &attachment.data)?;
        guard.track(artifact.clone());

        debug!(
            toggle = %pair.toggle,
            attachment = %attachment_key,
            "Materialized binary attachment to {:?}",
            artifact
        );
        params.insert(
            pair.target.clone(),
            Value::from(artifact.to_string_lossy().into_owned()),
        );
    }

    Ok(())
}

/// Output side: turn a decoded external result into the item's record.
pub fn bridge_out(result: ExternalResult, paired_item: usize) -> OutputRecord {
    match result {
        ExternalResult::Json(body) => OutputRecord::success(body, paired_item),
        ExternalResult::TextFallback(text) => OutputRecord::success(
            serde_json::json!({ "output": text, "parseError": true }),
            paired_item,
        ),
        ExternalResult::Binary {
            body,
            data,
            file_name,
        } => OutputRecord::with_binary(
            Value::Object(body),
            BinaryAttachment { data, file_name },
            paired_item,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct AttachmentHost(HashMap<String, BinaryAttachment>);

    impl HostContext for AttachmentHost {
        fn item_count(&self) -> usize {
            1
        }

        fn parameter_value(&self, _item: usize, _name: &str) -> Option<Value> {
            None
        }

        fn binary_attachment(&self, _item: usize, name: &str) -> Option<BinaryAttachment> {
            self.0.get(name).cloned()
        }

        fn continue_on_failure(&self) -> bool {
            true
        }
    }

    fn host_with(key: &str, bytes: &[u8]) -> AttachmentHost {
        let mut map = HashMap::new();
        map.insert(
            key.to_string(),
            BinaryAttachment {
                data: bytes.to_vec(),
                file_name: "clip.mp4".to_string(),
            },
        );
        AttachmentHost(map)
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_suffix_convention_materializes_attachment() {
        let dir = TempDir::new().unwrap();
        let host = host_with("data", b"abc");
        let mut p = params(json!({
            "inputIsBinary": true,
            "inputBinaryPropertyName": "data"
        }));

        let mut guard = ArtifactGuard::new();
        bridge_in(&mut p, &[], &host, 0, dir.path(), &mut guard).unwrap();

        let rewritten = p["inputBinaryPropertyName"].as_str().unwrap().to_string();
        assert_eq!(std::fs::read(&rewritten).unwrap(), b"abc");
        assert_eq!(p["inputIsBinary"], json!(true));
        assert_eq!(guard.tracked().len(), 1);

        drop(guard);
        assert!(!Path::new(&rewritten).exists());
    }

    #[test]
    fn test_toggle_false_is_ignored() {
        let dir = TempDir::new().unwrap();
        let host = host_with("data", b"abc");
        let mut p = params(json!({
            "inputIsBinary": false,
            "inputBinaryPropertyName": "data"
        }));

        let mut guard = ArtifactGuard::new();
        bridge_in(&mut p, &[], &host, 0, dir.path(), &mut guard).unwrap();
        assert_eq!(p["inputBinaryPropertyName"], json!("data"));
        assert!(guard.tracked().is_empty());
    }

    #[test]
    fn test_use_file_path_passthrough() {
        let dir = TempDir::new().unwrap();
        let host = AttachmentHost(HashMap::new());
        let mut p = params(json!({
            "inputIsBinary": true,
            "inputUseFilePath": true,
            "inputFilePath": "/media/clip.mp4",
            "inputBinaryPropertyName": "data"
        }));

        let mut guard = ArtifactGuard::new();
        bridge_in(&mut p, &[], &host, 0, dir.path(), &mut guard).unwrap();
        assert_eq!(p["inputFilePath"], json!("/media/clip.mp4"));
        assert_eq!(p["inputBinaryPropertyName"], json!("data"));
        assert!(guard.tracked().is_empty());
    }

    #[test]
    fn test_missing_attachment_errors() {
        let dir = TempDir::new().unwrap();
        let host = AttachmentHost(HashMap::new());
        let mut p = params(json!({
            "inputIsBinary": true,
            "inputBinaryPropertyName": "data"
        }));

        let mut guard = ArtifactGuard::new();
        let err = bridge_in(&mut p, &[], &host, 0, dir.path(), &mut guard);
        assert!(matches!(
            err,
            Err(DispatchError::BinaryAttachmentMissing { property, item: 0 }) if property == "data"
        ));
    }

    #[test]
    fn test_explicit_descriptor_takes_precedence() {
        let dir = TempDir::new().unwrap();
        let host = host_with("payload", b"xyz");
        // Toggle name does not follow the suffix convention at all
        let descriptors: Vec<ParameterDescriptor> = vec![serde_json::from_value(json!({
            "name": "attachInput", "type": "boolean",
            "kind": "binary-toggle", "targetField": "inputKey"
        }))
        .unwrap()];
        let mut p = params(json!({
            "attachInput": true,
            "inputKey": "payload"
        }));

        let mut guard = ArtifactGuard::new();
        bridge_in(&mut p, &descriptors, &host, 0, dir.path(), &mut guard).unwrap();
        let rewritten = p["inputKey"].as_str().unwrap();
        assert_eq!(std::fs::read(rewritten).unwrap(), b"xyz");
    }

    #[test]
    fn test_artifact_names_never_collide() {
        let dir = TempDir::new().unwrap();
        let a = unique_artifact_path(dir.path(), 0, "same.bin");
        let b = unique_artifact_path(dir.path(), 0, "same.bin");
        assert_ne!(a, b);
    }
}
