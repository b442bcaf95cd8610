//! End-to-end tests driving the `evt` binary.
//!
//! Only offline paths are exercised: validation, the race console without
//! saving, and failures that happen before or instead of a network round trip.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn evt_binary() -> String {
    env!("CARGO_BIN_EXE_evt").to_string()
}

/// A command isolated from the user's config files and `EVT_*` environment.
fn evt(home: &TempDir) -> Command {
    let mut cmd = Command::new(evt_binary());
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("EVT_API_BASE_URL")
        .env_remove("EVT_DEFAULT_EVENT")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn validate_accepts_and_normalizes() {
    let home = TempDir::new().unwrap();
    let output = evt(&home)
        .args([
            "validate", "--name", " anna ", "--surname", "kowalska", "--age", "30", "--gender",
            "female", "--race", "--race-role", "runner",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("Registration is valid\n"));
    assert!(out.contains("name:      Anna"));
    assert!(out.contains("race role: participant"));
}

#[test]
fn validate_rejects_with_exit_code_one() {
    let home = TempDir::new().unwrap();
    let output = evt(&home)
        .args(["validate", "--surname", "Lee", "--age", "200", "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"]["name"], "Name is required");
    assert_eq!(report["errors"]["age"], "Age must not exceed 150");
}

#[test]
fn validate_applies_event_restrictions() {
    let home = TempDir::new().unwrap();
    let output = evt(&home)
        .args([
            "validate",
            "--name",
            "Jan",
            "--surname",
            "Nowak",
            "--age",
            "12",
            "--age-limit",
            "children",
            "--max-child-age",
            "10",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("age: Sorry, only children up to 10 years can participate"));
}

#[test]
fn race_console_reads_commands_from_stdin() {
    let home = TempDir::new().unwrap();
    let mut child = evt(&home)
        .args(["race", "--event", "evt-1"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"status\nstart\nf\nf\nedit 2 7 00:10:00\nsort id\nfinish nope\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Race console for evt-1."));
    assert!(out.contains("Clock stopped, 0 entries"));
    assert!(out.contains("Race started: "));
    assert!(out.contains("Finisher 1: "));
    assert!(out.contains("Finisher 2: "));
    assert!(out.contains("Entry 2: 7 00:10:00"));
    assert!(out.contains("#  ID ↑  Time"));
    assert!(out.contains("error: unknown command: finish"));
}

#[test]
fn commands_without_event_explain_how_to_pick_one() {
    let home = TempDir::new().unwrap();
    let output = evt(&home).args(["results", "list"]).output().unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("--event"));
}

#[test]
fn invalid_base_url_is_reported() {
    let home = TempDir::new().unwrap();
    let output = evt(&home)
        .env("EVT_API_BASE_URL", "ftp://example.com")
        .arg("events")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("scheme must be http or https"));
}

#[test]
fn no_subcommand_prints_help() {
    let home = TempDir::new().unwrap();
    let output = evt(&home).output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage: evt"));
}
