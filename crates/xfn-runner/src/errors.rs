use std::io;
use std::path::PathBuf;
use thiserror::Error;
use xfn_manifest::ManifestError;

/// Errors that can occur while dispatching an item to an external function
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("form registry not initialized; call Dispatcher::initialize first")]
    FormNotReady,

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("function '{0}' not found in manifest")]
    FunctionNotFound(String),

    #[error("script for function '{function}' not found at {path}")]
    ScriptNotFound { function: String, path: PathBuf },

    #[error("no binary attachment '{property}' on item {item}")]
    BinaryAttachmentMissing { property: String, item: usize },

    #[error("interpreter '{0}' not found on PATH")]
    InterpreterNotFound(String),

    #[error("failed to launch script {script}: {source}")]
    ScriptLaunchFailed {
        script: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("script timed out after {secs}s")]
    ScriptTimeout { secs: u64 },

    #[error("script exited with status {exit_code}: {stderr}")]
    ScriptFailed { exit_code: i32, stderr: String },

    #[error("malformed binary result: {0}")]
    MalformedBinaryResult(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_context() {
        let err = DispatchError::FunctionNotFound("file_trimming".to_string());
        assert_eq!(
            err.to_string(),
            "function 'file_trimming' not found in manifest"
        );

        let err = DispatchError::ScriptFailed {
            exit_code: 3,
            stderr: "boom".to_string(),
        };
        assert!(err.to_string().contains("status 3"));
        assert!(err.to_string().contains("boom"));
    }
}
