//! CLI integration tests for the scriptbox command-line interface.
//!
//! Every invocation runs in a scratch directory with `SCRIPTBOX_CONFIG_DIR`
//! pointed at it, so the host's own config files are never read. Tests that
//! execute scripts need `python3` and are skipped without it.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the scriptbox binary, isolated from host config.
fn scriptbox(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("scriptbox").unwrap();
    cmd.current_dir(dir)
        .env("SCRIPTBOX_CONFIG_DIR", dir)
        .env_remove("SCRIPTBOX_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn python() -> Option<PathBuf> {
    let output = std::process::Command::new("which")
        .arg("python3")
        .output()
        .ok()?;
    let path = String::from_utf8(output.stdout).ok()?;
    let path = path.trim();
    (output.status.success() && !path.is_empty()).then(|| PathBuf::from(path))
}

/// Scratch dir whose project config runs scripts with the local python3
/// through the unsandboxed fallback.
fn python_workspace() -> Option<TempDir> {
    let Some(interpreter) = python() else {
        eprintln!("python3 not found; skipping");
        return None;
    };
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("scriptbox.toml"),
        format!(
            "[sandbox]\ninterpreter = \"{}\"\nisolation_tool = \"/nonexistent/nsjail\"\nfallback_pythonpath = \"\"\n\n[logging]\nfile = false\n",
            interpreter.display()
        ),
    )
    .unwrap();
    Some(dir)
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    scriptbox(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    scriptbox(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("scriptbox"));
}

#[test]
fn test_start_help_shows_overrides() {
    let dir = TempDir::new().unwrap();
    scriptbox(dir.path())
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    scriptbox(dir.path()).arg("chat").assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Run Command
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_run_missing_file() {
    let dir = TempDir::new().unwrap();
    scriptbox(dir.path())
        .args(["run", "nope.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_run_rejects_script_without_main() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("hello.py"), "print('Hello')\n").unwrap();

    scriptbox(dir.path())
        .args(["run", "hello.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Validation error: Script must contain a main() function",
        ));
}

#[test]
fn test_run_prints_json_result() {
    let Some(dir) = python_workspace() else { return };
    std::fs::write(
        dir.path().join("job.py"),
        "def main():\n    print('working')\n    return {\"answer\": 42}\n",
    )
    .unwrap();

    let output = scriptbox(dir.path())
        .args(["run", "job.py", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["result"]["answer"], 42);
    assert_eq!(body["stdout"], "working\n");
    assert_eq!(body["mode"], "unsandboxed_fallback");
}

#[test]
fn test_run_reports_exception() {
    let Some(dir) = python_workspace() else { return };
    std::fs::write(
        dir.path().join("boom.py"),
        "def main():\n    raise ValueError('Test error')\n",
    )
    .unwrap();

    scriptbox(dir.path())
        .args(["run", "boom.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Test error"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Check Command and Config
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_check_reports_missing_tool() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("scriptbox.toml"),
        "[sandbox]\nisolation_tool = \"/nonexistent/nsjail\"\n",
    )
    .unwrap();

    let output = scriptbox(dir.path())
        .args(["check", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["isolation"]["available"], false);
    assert_eq!(body["allow_fallback"], true);
    assert_eq!(body["config_files"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_explicit_config_must_load() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("bad.toml"), "not valid toml {{{{").unwrap();

    scriptbox(dir.path())
        .args(["--config", "bad.toml", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn test_discovered_bad_config_is_a_warning() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("scriptbox.toml"), "not valid toml {{{{").unwrap();

    scriptbox(dir.path())
        .arg("check")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning: Failed to load"));
}
