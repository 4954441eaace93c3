//! Integration tests for the xfn CLI

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn xfn(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("xfn").unwrap();
    // Isolate from any user-level config file
    cmd.env("XFN_CONFIG", dir.path().join("no-config.toml"));
    cmd
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    xfn(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("xfn"));
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    xfn(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Manifest-driven dispatcher"));
}

#[test]
fn test_functions_without_manifest() {
    let dir = TempDir::new().unwrap();
    xfn(&dir)
        .args(["functions", "--root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No functions available"));
}

#[test]
fn test_run_with_missing_input_file() {
    let dir = TempDir::new().unwrap();
    xfn(&dir)
        .args(["run", "anything", "--input"])
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("items file"));
}

#[test]
fn test_invalid_command() {
    let dir = TempDir::new().unwrap();
    xfn(&dir).arg("invalid").assert().failure();
}

#[cfg(unix)]
mod with_fixture {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_fixture(dir: &TempDir) {
        fs::write(
            dir.path().join("functions.json"),
            serde_json::to_string(&json!({
                "functions": [{
                    "name": "Echo Status",
                    "value": "echo_status",
                    "uiFile": "echo_status.json",
                    "scriptFile": "echo_status.sh"
                }]
            }))
            .unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join("echo_status.json"),
            serde_json::to_string(&json!({
                "properties": [{"name": "mode", "type": "string"}]
            }))
            .unwrap(),
        )
        .unwrap();

        let script = dir.path().join("echo_status.sh");
        fs::write(&script, "#!/bin/sh\necho '{\"status\":\"ok\"}'\n").unwrap();
        let mut perms = fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script, perms).unwrap();
    }

    #[test]
    fn test_functions_lists_form() {
        let dir = TempDir::new().unwrap();
        write_fixture(&dir);

        xfn(&dir)
            .args(["functions", "--root"])
            .arg(dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("echo_status"))
            .stdout(predicate::str::contains("mode [string]"));
    }

    #[test]
    fn test_run_emits_one_record_per_item() {
        let dir = TempDir::new().unwrap();
        write_fixture(&dir);

        let items = dir.path().join("items.json");
        fs::write(
            &items,
            serde_json::to_string(&json!({
                "items": [
                    {"parameters": {"mode": "a"}},
                    {"parameters": {"mode": "b"}}
                ]
            }))
            .unwrap(),
        )
        .unwrap();

        let assert = xfn(&dir)
            .args(["run", "echo_status", "--input"])
            .arg(&items)
            .args(["--root"])
            .arg(dir.path())
            .assert()
            .success();

        let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
        let records: serde_json::Value = serde_json::from_str(&stdout).unwrap();
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["json"], json!({"status": "ok"}));
        assert_eq!(records[1]["pairedItem"], 1);
    }

    #[test]
    fn test_run_unknown_function_aborts() {
        let dir = TempDir::new().unwrap();
        write_fixture(&dir);

        let items = dir.path().join("items.json");
        fs::write(&items, r#"{"items": [{}]}"#).unwrap();

        xfn(&dir)
            .args(["run", "ghost", "--input"])
            .arg(&items)
            .args(["--root"])
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found in manifest"));
    }
}
