// Integration tests for CLI commands
// These run the built binary against temporary config, script and state files.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn custody(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_custody"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

const APPROVE_AND_EXECUTE: &str = r#"
[[step]]
op = "deposit"
caller = "treasury"
amount = 50

[[step]]
op = "submit"
caller = "alice"
target = "dave"
value = 20

[[step]]
op = "confirm"
caller = "alice"
index = 0

[[step]]
op = "confirm"
caller = "bob"
index = 0

[[step]]
op = "execute"
caller = "carol"
index = 0
expect = "ok"
"#;

#[test]
fn test_cli_help() {
    let output = custody(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shared-custody approval ledger"));
    for command in ["init", "members", "replay", "inspect", "version"] {
        assert!(stdout.contains(command), "missing {command}");
    }
}

#[test]
fn test_cli_version() {
    let output = custody(&["version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("custody {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_cli_invalid_command() {
    let output = custody(&["withdraw-everything"]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_init_then_members() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");

    let output = custody(&["init", "--config", path_arg(&config)]);
    assert!(output.status.success());
    assert!(config.exists());

    let output = custody(&["init", "--config", path_arg(&config)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));

    let output = custody(&["members", "--config", path_arg(&config)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 members, quorum 2"));
    assert!(stdout.contains("alice"));
}

#[test]
fn test_cli_replay_persists_and_resumes() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");
    let script = temp_dir.path().join("session.toml");
    let state = temp_dir.path().join("ledger.cbor");

    assert!(custody(&["init", "--config", path_arg(&config)])
        .status
        .success());
    std::fs::write(&script, APPROVE_AND_EXECUTE).unwrap();

    let output = custody(&[
        "replay",
        path_arg(&script),
        "--config",
        path_arg(&config),
        "--state",
        path_arg(&state),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(state.exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ProposalExecuted"));
    assert!(stdout.contains("Pool balance: 30"));

    // Second session resumes: the proposal is already executed.
    std::fs::write(
        &script,
        r#"
        [[step]]
        op = "execute"
        caller = "alice"
        index = 0
        expect = "AlreadyExecuted"
        "#,
    )
    .unwrap();
    let output = custody(&[
        "replay",
        path_arg(&script),
        "--config",
        path_arg(&config),
        "--state",
        path_arg(&state),
    ]);
    assert!(output.status.success());

    let output = custody(&["inspect", path_arg(&state), "--config", path_arg(&config), "--json"]);
    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["pool_balance"], 30);
    assert_eq!(view["proposals"][0]["status"], "executed");
    assert_eq!(view["proposals"][0]["target"], "dave");
}

#[test]
fn test_cli_replay_json_audit_trail() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");
    let script = temp_dir.path().join("session.toml");

    assert!(custody(&["init", "--config", path_arg(&config)])
        .status
        .success());
    std::fs::write(&script, APPROVE_AND_EXECUTE).unwrap();

    let output = custody(&[
        "replay",
        path_arg(&script),
        "--config",
        path_arg(&config),
        "--json",
    ]);
    assert!(output.status.success());

    let trail: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = trail.as_array().unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0]["sequence"], 0);
    assert!(entries[4]["event"].get("ProposalExecuted").is_some());
}

#[test]
fn test_cli_replay_expectation_mismatch_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");
    let script = temp_dir.path().join("session.toml");

    assert!(custody(&["init", "--config", path_arg(&config)])
        .status
        .success());
    std::fs::write(
        &script,
        r#"
        [[step]]
        op = "submit"
        caller = "mallory"
        target = "dave"
        expect = "ok"
        "#,
    )
    .unwrap();

    let output = custody(&[
        "replay",
        path_arg(&script),
        "--config",
        path_arg(&config),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Unauthorized"));
}

#[test]
fn test_cli_replay_rejects_committee_change() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.toml");
    let script = temp_dir.path().join("session.toml");
    let state = temp_dir.path().join("ledger.cbor");

    assert!(custody(&["init", "--config", path_arg(&config)])
        .status
        .success());
    std::fs::write(&script, "").unwrap();
    let args = [
        "replay",
        path_arg(&script),
        "--config",
        path_arg(&config),
        "--state",
        path_arg(&state),
    ];
    assert!(custody(&args).status.success());

    let edited = std::fs::read_to_string(&config)
        .unwrap()
        .replace("quorum = 2", "quorum = 3");
    std::fs::write(&config, edited).unwrap();

    let output = custody(&args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not match"));
}

#[test]
fn test_cli_inspect_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = custody(&["inspect", path_arg(&temp_dir.path().join("nope.cbor"))]);
    assert!(!output.status.success());
}
