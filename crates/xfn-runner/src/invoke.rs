//! External process invocation
//!
//! Resolved parameters are serialized to a transient JSON file whose path
//! is passed as the script's single argument. stdout and stderr are
//! captured in full by reader threads (expected payloads are small), and a
//! poll loop enforces the execution timeout, killing the child on
//! deadline. Exactly one success or failure is produced per attempt and
//! the child never outlives the call.

use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::bridge::{unique_artifact_path, ArtifactGuard};
use crate::errors::{DispatchError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default execution timeout for external scripts.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Spawns external scripts with a serialized parameter file.
#[derive(Debug, Clone)]
pub struct Invoker {
    timeout: Duration,
    interpreter: Option<String>,
}

impl Default for Invoker {
    fn default() -> Self {
        Invoker {
            timeout: DEFAULT_TIMEOUT,
            interpreter: None,
        }
    }
}

impl Invoker {
    pub fn new(timeout: Duration, interpreter: Option<String>) -> Self {
        Invoker {
            timeout,
            interpreter,
        }
    }

    /// Run `script` with `params` and return its stdout.
    ///
    /// The parameter file is tracked on `guard` and removed with the rest
    /// of the item's transient artifacts.
    pub fn invoke(
        &self,
        script: &Path,
        params: &Map<String, Value>,
        work_dir: &Path,
        item_index: usize,
        guard: &mut ArtifactGuard,
    ) -> Result<String> {
        std::fs::create_dir_all(work_dir)?;
        let params_path = unique_artifact_path(work_dir, item_index, "params.json");
        std::fs::write(&params_path, serde_json::to_vec(params)?)?;
        guard.track(params_path.clone());

        let mut command = match &self.interpreter {
            Some(interpreter) => {
                let resolved = which::which(interpreter)
                    .map_err(|_| DispatchError::InterpreterNotFound(interpreter.clone()))?;
                let mut cmd = Command::new(resolved);
                cmd.arg(script);
                cmd
            }
            None => Command::new(script),
        };
        command
            .arg(&params_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Spawning script {:?} (timeout {:?})", script, self.timeout);
        let mut child = command.spawn().map_err(|e| DispatchError::ScriptLaunchFailed {
            script: script.to_path_buf(),
            source: e,
        })?;

        // Drain pipes off-thread so a chatty script cannot deadlock the
        // try_wait poll loop on a full pipe buffer.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        warn!("Script {:?} exceeded timeout, killing", script);
                        if let Err(e) = child.kill() {
                            warn!("Failed to kill timed-out script: {e}");
                        }
                        let _ = child.wait();
                        join_reader(stdout_reader);
                        join_reader(stderr_reader);
                        return Err(DispatchError::ScriptTimeout {
                            secs: self.timeout.as_secs(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        };

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        if status.success() {
            Ok(String::from_utf8_lossy(&stdout).into_owned())
        } else {
            Err(DispatchError::ScriptFailed {
                exit_code: status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            })
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = source.read_to_end(&mut buf) {
            warn!("Failed to drain child pipe: {e}");
        }
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
