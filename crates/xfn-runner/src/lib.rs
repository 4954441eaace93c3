//! xfn runner - the dispatch pipeline
//!
//! Takes a loaded function manifest and turns host items into external
//! process invocations: dynamic form registration, per-item parameter
//! resolution, binary bridging through transient files, subprocess
//! execution with a timeout, and result decoding back into output records.

pub mod bridge;
pub mod decode;
pub mod errors;
pub mod executor;
pub mod form;
pub mod host;
pub mod invoke;
pub mod resolve;

pub use errors::DispatchError;
pub use executor::{Dispatcher, DispatcherConfig};
pub use form::{FormProperty, FormRegistry};
pub use host::{BinaryAttachment, BinaryOutput, HostContext, OutputRecord};
pub use invoke::Invoker;
