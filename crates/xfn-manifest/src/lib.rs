//! xfn manifest management
//!
//! This crate handles the function registry (the manifest file enumerating
//! available external functions) and the per-function UI schemas that
//! describe their input parameters. It owns the load-time error taxonomy;
//! execution-time concerns live in `xfn-runner`.

pub mod errors;
pub mod registry;
pub mod schema;

pub use errors::ManifestError;
pub use registry::{FunctionEntry, FunctionRegistry};
pub use schema::{load_ui_schema, DisplayOptions, ParameterDescriptor, KIND_BINARY_TOGGLE};
