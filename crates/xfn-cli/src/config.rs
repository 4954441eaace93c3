//! CLI configuration file
//!
//! TOML file with optional overrides for the functions root, the script
//! timeout and the interpreter. A missing file is not an error; every
//! field also has a CLI-flag override.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct XfnConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
}

impl XfnConfig {
    pub fn path() -> PathBuf {
        // Honor explicit override via XFN_CONFIG for tests / isolated runs.
        if let Ok(env_path) = std::env::var("XFN_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir().map_or_else(
                || PathBuf::from(".config/xfn/xfn.toml"),
                |h| h.join(".config").join("xfn").join("xfn.toml"),
            )
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map_or_else(
                || PathBuf::from("xfn\\xfn.toml"),
                |c| c.join("xfn").join("xfn.toml"),
            )
        }
    }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(XfnConfig::default())
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let config = XfnConfig {
            functions_root: Some("/opt/functions".to_string()),
            timeout_secs: Some(60),
            interpreter: Some("python3".to_string()),
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: XfnConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.timeout_secs, Some(60));
        assert_eq!(parsed.interpreter.as_deref(), Some("python3"));
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let parsed: XfnConfig = toml::from_str("").unwrap();
        assert!(parsed.functions_root.is_none());
        assert!(parsed.timeout_secs.is_none());
        assert!(parsed.interpreter.is_none());
    }
}
