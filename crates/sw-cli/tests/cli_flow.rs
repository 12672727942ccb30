//! End-to-end tests driving the `sw` binary against a scratch database.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn sw_binary() -> String {
    env!("CARGO_BIN_EXE_sw").to_string()
}

/// Run `sw` with its config and data isolated under `temp`.
fn sw(temp: &Path, args: &[&str]) -> Output {
    Command::new(sw_binary())
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join(".config"))
        .env("SW_DATABASE_PATH", temp.join("data/sw.dat"))
        .args(args)
        .output()
        .expect("failed to run sw")
}

fn sw_ok(temp: &Path, args: &[&str]) -> String {
    let output = sw(temp, args);
    assert!(
        output.status.success(),
        "sw {args:?} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_record_and_report() {
    let temp = TempDir::new().unwrap();

    assert_eq!(sw_ok(temp.path(), &["group", "add", "Client A"]), "Added group 1: Client A\n");
    sw_ok(temp.path(), &["task", "add", "1", "Design", "--cost-code", "CC-1"]);
    sw_ok(temp.path(), &["task", "add", "1", "Support", "--cost-code", "CC-2"]);
    sw_ok(
        temp.path(),
        &["slices", "set", "1", "1", "2024-01-01T09:00:00Z", "2024-01-01T11:00:00Z"],
    );
    sw_ok(
        temp.path(),
        &["slices", "set", "1", "2", "2024-01-02T13:00:00Z", "2024-01-02T13:30:00Z"],
    );

    let report = sw_ok(
        temp.path(),
        &[
            "report", "--group", "1", "--start", "2024-01-01", "--end", "2024-01-02", "--utc",
            "--json",
        ],
    );
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["total"], "2h30m0s");
    assert_eq!(report["cost_codes"][0]["cost_code"], "CC-1");
    assert_eq!(report["cost_codes"][0]["total"], "2h0m0s");
    assert_eq!(report["cost_codes"][1]["dates"][1]["used"], "30m0s");

    assert!(temp.path().join("data/sw.dat").exists());
}

#[test]
fn test_start_stop_active() {
    let temp = TempDir::new().unwrap();
    sw_ok(temp.path(), &["group", "add", "Internal"]);
    sw_ok(temp.path(), &["task", "add", "1", "Email"]);

    let started = sw_ok(temp.path(), &["start", "1", "1"]);
    assert!(started.starts_with("Started 1/1 Email at "));
    assert!(sw_ok(temp.path(), &["active"]).contains("running since"));
    assert_eq!(sw_ok(temp.path(), &["history"]), "1/1 Email (running)\n");

    let stopped = sw_ok(temp.path(), &["stop"]);
    assert!(stopped.starts_with("Stopped 1/1 Email"));
    assert_eq!(sw_ok(temp.path(), &["active"]), "No active task.\n");

    let output = sw(temp.path(), &["stop"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no active task"));
}

#[test]
fn test_missing_task_fails() {
    let temp = TempDir::new().unwrap();
    sw_ok(temp.path(), &["group", "add", "Internal"]);

    let output = sw(temp.path(), &["start", "1", "9"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("task 9 not found in group 1"));
}
