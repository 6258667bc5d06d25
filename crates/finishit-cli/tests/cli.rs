//! CLI E2E tests against the built binary.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Invoke the CLI with an isolated HOME and return (stdout, stderr, code).
fn run_cli(home: &TempDir, args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_finishit"))
        .args(args)
        .env("HOME", home.path())
        .env_remove("FINISHIT_ENV")
        .env_remove("FINISHIT_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");

    let output = child.wait_with_output().expect("Failed to wait for CLI");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{}' to contain '{}'",
        haystack, needle
    );
}

#[test]
fn ranks_lists_the_whole_ladder() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["ranks"], "");
    assert_eq!(code, 0);
    assert_contains(&stdout, "Mizunoto");
    assert_contains(&stdout, "5000");
    assert_eq!(stdout.lines().count(), 11);
}

#[test]
fn techniques_lists_cadences() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&home, &["techniques"], "");
    assert_eq!(code, 0);
    assert_contains(&stdout, "Water Breathing");
    let stone = stdout.lines().find(|l| l.starts_with("stone")).unwrap();
    assert_contains(stone, "(18s cycle)");
    assert_eq!(stdout.lines().count(), 12);
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&home, &["config", "set", "defaults.minutes", "40"], "");
    assert_eq!(code, 0);
    let (stdout, _, code) = run_cli(&home, &["config", "get", "defaults.minutes"], "");
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "40");

    let (_, stderr, code) = run_cli(&home, &["config", "get", "nope"], "");
    assert_eq!(code, 1);
    assert_contains(&stderr, "unknown key");
}

#[test]
fn interactive_session_completes_a_task() {
    let home = TempDir::new().unwrap();
    let script = "add Write report -m 25\nstart 1\ndone #1 done well\nstats\nquit\n";
    let (stdout, _, code) = run_cli(&home, &["run"], script);
    assert_eq!(code, 0);
    assert_contains(&stdout, "started task-0-0, 25:00 to go");
    assert_contains(&stdout, "done task-0-0: \"done well\"");
    assert_contains(&stdout, "(15 points)");
}

#[test]
fn interactive_session_rejects_blank_tasks() {
    let home = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(&home, &["run", "--json"], "add -m 5\nlist\n");
    assert_eq!(code, 0);
    assert_contains(&stderr, "must not be blank");
    let snapshot: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(snapshot["tasks"].as_array().map(Vec::len), Some(0));
}

#[test]
fn json_session_keeps_stdout_machine_readable() {
    let home = TempDir::new().unwrap();
    let script = "help\nfocus\nadd Write report -m 5\nstart 1\nfocus\ndone #1 shipped\nquit\n";
    let (stdout, stderr, code) = run_cli(&home, &["run", "--json"], script);
    assert_eq!(code, 0);
    assert_contains(&stderr, "focus mode on");
    assert_contains(&stderr, "commands:");

    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON: {l:?} ({e})")))
        .collect();
    let done = &lines[lines.len() - 2];
    assert_eq!(done["tasks"][0]["status"], "done");
    assert_eq!(done["tasks"][0]["victory_note"], "shipped");
    assert_eq!(lines[lines.len() - 1]["overall"]["completed_tasks"], 1);
}
