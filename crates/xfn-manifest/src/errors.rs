use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the function manifest or a UI schema
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("function manifest not found at {path}")]
    Missing { path: PathBuf },

    #[error("failed to parse function manifest: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("duplicate function id '{0}' in manifest")]
    DuplicateFunction(String),

    #[error("cannot read UI schema for function '{function}': {reason}")]
    SchemaUnreadable { function: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
