pub mod functions;
pub mod run;

use std::path::PathBuf;
use std::time::Duration;

use xfn_runner::DispatcherConfig;

use crate::config::XfnConfig;

/// Merge the config file with CLI-flag overrides into a dispatcher config.
/// Flags win over the file, the file wins over defaults.
pub fn build_dispatcher_config(
    config: &XfnConfig,
    root_flag: Option<PathBuf>,
    timeout_flag: Option<u64>,
    interpreter_flag: Option<String>,
) -> DispatcherConfig {
    let root = root_flag
        .or_else(|| config.functions_root.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut dispatcher_config = DispatcherConfig::new(root);
    if let Some(secs) = timeout_flag.or(config.timeout_secs) {
        dispatcher_config.timeout = Duration::from_secs(secs);
    }
    dispatcher_config.interpreter = interpreter_flag.or_else(|| config.interpreter.clone());
    dispatcher_config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_win_over_config_file() {
        let config = XfnConfig {
            functions_root: Some("/from/file".to_string()),
            timeout_secs: Some(10),
            interpreter: Some("python3".to_string()),
        };

        let merged = build_dispatcher_config(
            &config,
            Some(PathBuf::from("/from/flag")),
            Some(5),
            None,
        );
        assert_eq!(merged.functions_root, PathBuf::from("/from/flag"));
        assert_eq!(merged.timeout, Duration::from_secs(5));
        assert_eq!(merged.interpreter.as_deref(), Some("python3"));
        assert_eq!(
            merged.manifest_path,
            PathBuf::from("/from/flag/functions.json")
        );
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let merged = build_dispatcher_config(&XfnConfig::default(), None, None, None);
        assert_eq!(merged.functions_root, PathBuf::from("."));
        assert_eq!(merged.timeout, Duration::from_secs(30));
        assert!(merged.interpreter.is_none());
    }
}
