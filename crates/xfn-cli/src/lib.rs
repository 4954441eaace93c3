//! xfn library - expose modules for testing
//!
//! The CLI binary lives in `main.rs`; these modules are exposed so
//! integration tests can exercise the config and host layers directly.

pub mod commands;
pub mod common;
pub mod config;
pub mod json_host;

pub use common::GlobalOpts;
pub use config::XfnConfig;
pub use json_host::JsonHost;
