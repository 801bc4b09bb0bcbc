//! End-to-end tests for the `tap-run` binary.
//!
//! Usage:
//!   cargo test --test cli

#![cfg(unix)]

use std::process::Command;

fn tap_run() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tap-run"))
}

#[test]
fn passing_commands() {
    let out = tap_run()
        .args(["--plan", "-n", "greets", "echo hello", "true"])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "1..2\nok 1 - greets\n# hello\nok 2 - true\n"
    );
}

#[test]
fn failing_command_reports_exit_code() {
    let out = tap_run()
        .args(["echo oops >&2; exit 3", "true"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "1..0\nnot ok 1 - echo oops >&2; exit 3\n# oops\n# exit code 3\nok 2 - true\n# Tests failed: 1/2\n"
    );
}

#[test]
fn writes_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.tap");
    let out = tap_run()
        .arg("--tap-version")
        .arg("-o")
        .arg(&path)
        .arg("printf 'a\\nb\\n'")
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        "TAP version 14\n1..0\nok 1 - printf 'a\\nb\\n'\n# a\n# b\n"
    );
}

#[test]
fn requires_a_command() {
    let out = tap_run().output().unwrap();
    assert!(!out.status.success());
}
