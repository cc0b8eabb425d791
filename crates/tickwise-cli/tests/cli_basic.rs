//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated data directory and verify
//! the JSON it prints.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_tickwise"))
        .args(args)
        .env("TICKWISE_DATA_DIR", data_dir)
        .env_remove("TICKWISE_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn quiet_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for key in [
        "feedback.sound_enabled",
        "feedback.notification_enabled",
        "feedback.vibration_enabled",
    ] {
        let (_, stderr, code) = run_cli(dir.path(), &["config", "set", key, "false"]);
        assert_eq!(code, 0, "config set {key} failed: {stderr}");
    }
    dir
}

#[test]
fn test_countdown_start_and_status() {
    let dir = quiet_dir();
    let started = run_json(dir.path(), &["countdown", "start", "1"]);
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["mode"], "countdown");
    assert_eq!(started["duration_ms"], 60_000);

    let status = run_json(dir.path(), &["countdown", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["is_active"], true);
    assert!(status["time_left_ms"].as_u64().unwrap() <= 60_000);
}

#[test]
fn test_countdown_rejects_invalid_duration() {
    let dir = quiet_dir();
    let (_, stderr, code) = run_cli(dir.path(), &["countdown", "start", "-5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr: {stderr}");

    let status = run_json(dir.path(), &["countdown", "status"]);
    assert_eq!(status["is_active"], false);
}

#[test]
fn test_countdown_pause_survives_between_invocations() {
    let dir = quiet_dir();
    run_json(dir.path(), &["countdown", "start", "10"]);
    let paused = run_json(dir.path(), &["countdown", "pause"]);
    assert_eq!(paused["type"], "TimerPaused");

    let status = run_json(dir.path(), &["countdown", "status"]);
    assert_eq!(status["is_paused"], true);
    assert_eq!(status["is_active"], false);

    let resumed = run_json(dir.path(), &["countdown", "resume"]);
    assert_eq!(resumed["type"], "TimerResumed");
}

#[test]
fn test_stopwatch_laps() {
    let dir = quiet_dir();
    run_json(dir.path(), &["stopwatch", "start"]);
    let lap = run_json(dir.path(), &["stopwatch", "lap"]);
    assert_eq!(lap["type"], "LapRecorded");
    assert_eq!(lap["lap"]["id"], 1);
    run_json(dir.path(), &["stopwatch", "lap"]);

    let laps = run_json(dir.path(), &["stopwatch", "laps"]);
    let laps = laps.as_array().unwrap();
    assert_eq!(laps.len(), 2);
    assert_eq!(laps[0]["id"], 2);

    let killed = run_json(dir.path(), &["stopwatch", "kill"]);
    assert_eq!(killed["type"], "TimerKilled");
    assert_eq!(killed["summary"]["mode"], "stopwatch");
}

#[test]
fn test_interval_start_and_kill() {
    let dir = quiet_dir();
    let started = run_json(
        dir.path(),
        &["interval", "start", "--work", "25", "--break", "5", "--loops", "2", "--name", "Deep work"],
    );
    assert_eq!(started["type"], "TimerStarted");
    assert_eq!(started["duration_ms"], 25 * 60_000);

    let killed = run_json(dir.path(), &["interval", "kill"]);
    assert_eq!(killed["summary"]["mode"], "interval");
    assert_eq!(killed["summary"]["session_name"], "Deep work");
    assert_eq!(killed["summary"]["target_loop_count"], 2);
    assert_eq!(killed["summary"]["cycle_count"], 0);
}

#[test]
fn test_interval_rejects_zero_loops() {
    let dir = quiet_dir();
    let (_, stderr, code) = run_cli(dir.path(), &["interval", "start", "--loops", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "feedback.volume", "70"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "feedback.volume"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "70");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "feedback.nope", "1"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "feedback.nope"]);
    assert_eq!(code, 1);

    let listed = run_json(dir.path(), &["config", "list"]);
    assert_eq!(listed["interval"]["work_minutes"], 25.0);
}

#[test]
fn test_config_reset_one_section_keeps_the_others() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "feedback.volume", "10"]);
    run_cli(dir.path(), &["config", "set", "interval.loops", "7"]);
    run_cli(dir.path(), &["config", "set", "ticker.cadence_ms", "250"]);

    let reset = run_json(dir.path(), &["config", "reset", "--section", "interval"]);
    assert_eq!(reset["reset"], serde_json::json!(["interval"]));
    let listed = run_json(dir.path(), &["config", "list"]);
    assert_eq!(listed["interval"]["loops"], 0);
    assert_eq!(listed["feedback"]["volume"], 10);
    assert_eq!(listed["ticker"]["cadence_ms"], 250);

    let reset = run_json(dir.path(), &["config", "reset"]);
    assert_eq!(reset["reset"], serde_json::json!(["feedback", "interval", "ticker"]));
    let feedback = run_json(dir.path(), &["config", "list", "--section", "feedback"]);
    assert_eq!(feedback["volume"], 50);
    assert!(feedback.get("interval").is_none());
}

#[test]
fn test_history_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let stats = run_json(dir.path(), &["history", "stats"]);
    assert_eq!(stats["total_sessions"], 0);
    let list = run_json(dir.path(), &["history", "list"]);
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn test_watch_completes_countdown_and_records_history() {
    let dir = quiet_dir();
    // 0.05 minutes = 3 seconds.
    run_json(dir.path(), &["countdown", "start", "0.05"]);

    let (stdout, stderr, code) = run_cli(dir.path(), &["watch", "countdown", "--every", "0"]);
    assert_eq!(code, 0, "watch failed: {stderr}");
    let events: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events[0]["type"], "TimerRestored");
    assert_eq!(events[0]["outcome"], "running");
    let completed: Vec<_> = events
        .iter()
        .filter(|e| e["type"] == "SessionCompleted")
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["cycle_count"], 1);

    let list = run_json(dir.path(), &["history", "list"]);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["mode"], "countdown");
}

#[test]
fn test_watch_idle_exits_immediately() {
    let dir = quiet_dir();
    let (stdout, _, code) = run_cli(dir.path(), &["watch", "interval"]);
    assert_eq!(code, 0);
    let first: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(first["outcome"], "idle");
}

#[test]
fn test_completions_generate() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("tickwise"));
}
