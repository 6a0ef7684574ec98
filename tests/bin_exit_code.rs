// tests/bin_exit_code.rs

//! End-to-end checks on the installed binary: exit codes and the
//! dry-run mode. Each run gets its own working directory so no stray
//! `Serverun.toml` can interfere.

#![cfg(unix)]

use std::process::Command;

fn serverun() -> (tempfile::TempDir, Command) {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_serverun"));
    cmd.current_dir(dir.path());
    (dir, cmd)
}

#[test]
fn successful_command_exits_zero() {
    let (_dir, mut cmd) = serverun();
    let status = cmd.args(["--command", "true"]).status().expect("binary runs");
    assert_eq!(status.code(), Some(0));
}

#[test]
fn failing_command_exit_code_is_propagated() {
    let (_dir, mut cmd) = serverun();
    let status = cmd
        .args(["--command", "exit 7"])
        .status()
        .expect("binary runs");
    assert_eq!(status.code(), Some(7));
}

#[test]
fn config_errors_exit_one() {
    let (_dir, mut cmd) = serverun();
    let output = cmd.output().expect("binary runs");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no command"));
}

#[test]
fn dry_run_prints_the_resolved_run_and_exits_zero() {
    let (_dir, mut cmd) = serverun();
    let output = cmd
        .args([
            "--command",
            "npm run e2e",
            "--arg",
            "--headless",
            "--service",
            "npm run dev",
            "--ready-pattern",
            "compiled",
            "--watch",
            "--dry-run",
        ])
        .output()
        .expect("binary runs");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("npm run e2e"));
    assert!(stdout.contains("npm run dev"));
    assert!(stdout.contains("--headless"));
}

#[test]
fn command_output_reaches_stdout_logging() {
    let (_dir, mut cmd) = serverun();
    let output = cmd
        .args(["--command", "echo marker-line-4242"])
        .output()
        .expect("binary runs");

    assert_eq!(output.status.code(), Some(0));
    // Logging goes to stderr; the command's output is streamed through
    // the log layer.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("marker-line-4242"));
}
