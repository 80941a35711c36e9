//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data
//! directory and checks stdout, stderr and the exit code.

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_timerqueue"))
        .args(args)
        .env("TIMERQUEUE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

/// Start `run --minimal` in the background.
fn spawn_run(data_dir: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_timerqueue"))
        .args(["run", "--minimal"])
        .env("TIMERQUEUE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn runner")
}

fn wait_until(what: &str, mut ready: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(15);
    while !ready() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn wait_for_exit(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + Duration::from_secs(15);
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() > deadline {
            child.kill().ok();
            panic!("runner did not exit");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

fn logged(data_dir: &Path) -> Vec<serde_json::Value> {
    let json = run_ok(data_dir, &["log", "show", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    parsed.as_array().unwrap().clone()
}

fn queued_labels(data_dir: &Path) -> Vec<String> {
    let json = run_ok(data_dir, &["list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|spec| spec["label"].as_str().unwrap().to_string())
        .collect()
}

fn queued_ids(data_dir: &Path) -> Vec<String> {
    let json = run_ok(data_dir, &["list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|spec| spec["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_add_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_ok(dir.path(), &["add", "Write", "25m"]);
    assert!(out.contains("queued"));
    assert!(out.contains("25:00"));
    run_ok(dir.path(), &["add", "Stretch", "90s"]);

    let list = run_ok(dir.path(), &["list"]);
    let write = list.find("Write").unwrap();
    let stretch = list.find("Stretch").unwrap();
    assert!(write < stretch, "queue order lost: {list}");
    assert!(list.contains("2 timer(s)"));
    assert_eq!(queued_ids(dir.path()).len(), 2);
}

#[test]
fn test_add_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["add", "Nap", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, stderr, code) = run_cli(dir.path(), &["add", "   ", "5m"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    assert!(queued_ids(dir.path()).is_empty());
}

#[test]
fn test_remove_by_id_and_prefix() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["add", "A", "1m"]);
    run_ok(dir.path(), &["add", "B", "1m"]);
    let ids = queued_ids(dir.path());

    let out = run_ok(dir.path(), &["remove", &ids[0]]);
    assert!(out.contains("removed"));
    let out = run_ok(dir.path(), &["remove", &ids[1][..8]]);
    assert!(out.contains("removed"));
    assert!(queued_ids(dir.path()).is_empty());

    let out = run_ok(dir.path(), &["remove", &ids[0]]);
    assert!(out.contains("not found"));
}

#[test]
fn test_clear_keeps_log() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["add", "A", "1m"]);
    run_ok(dir.path(), &["add", "B", "2m"]);
    run_ok(dir.path(), &["clear"]);
    assert!(queued_ids(dir.path()).is_empty());
    assert!(run_ok(dir.path(), &["log", "show"]).contains("no runs logged"));
}

#[test]
fn test_run_with_empty_queue_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["run", "--minimal"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("queue is empty"));
}

#[test]
fn test_run_logs_completed_timers() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["add", "First", "200ms"]);
    run_ok(dir.path(), &["add", "Second", "150ms"]);

    let out = run_ok(dir.path(), &["run", "--minimal"]);
    assert!(out.contains("started: First"));
    assert!(out.contains("finished: Second"));
    assert!(out.contains("2 timer(s) run"));
    assert!(queued_ids(dir.path()).is_empty());

    let json = run_ok(dir.path(), &["log", "show", "--json"]);
    let entries: serde_json::Value = serde_json::from_str(&json).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["label"], "First");
    assert_eq!(entries[0]["outcome"], "completed");
    assert!(entries[0]["actual_elapsed_ms"].as_u64().unwrap() >= 200);
    assert_eq!(entries[1]["label"], "Second");

    let summary = run_ok(dir.path(), &["log", "summary"]);
    assert!(summary.contains("completed: 2"));
}

#[test]
fn test_add_during_run_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["add", "First", "1500ms"]);
    let mut runner = spawn_run(dir.path());
    wait_until("First to start", || queued_ids(dir.path()).is_empty());

    let out = run_ok(dir.path(), &["add", "Late", "300ms"]);
    assert!(out.contains("queued"));
    assert!(wait_for_exit(&mut runner).success());

    let ran: Vec<String> = logged(dir.path())
        .iter()
        .map(|entry| entry["label"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ran[0], "First");
    let still_queued = queued_labels(dir.path());
    assert!(
        ran.iter().any(|label| label == "Late") || still_queued == ["Late"],
        "Late vanished: ran {ran:?}, queued {still_queued:?}"
    );
}

#[test]
fn test_second_run_is_refused_while_one_is_active() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["add", "Long", "5m"]);
    run_ok(dir.path(), &["add", "Next", "5m"]);
    let mut runner = spawn_run(dir.path());
    wait_until("Long to start", || queued_ids(dir.path()).len() == 1);

    let (_, stderr, code) = run_cli(dir.path(), &["run", "--minimal"]);
    runner.kill().ok();
    runner.wait().ok();
    assert_eq!(code, 1);
    assert!(stderr.contains("already running"));
}

#[cfg(unix)]
#[test]
fn test_terminated_run_logs_active_timer() {
    let dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["add", "A", "5m"]);
    run_ok(dir.path(), &["add", "B", "5m"]);
    let mut runner = spawn_run(dir.path());
    wait_until("A to start", || queued_ids(dir.path()).len() == 1);

    let status = Command::new("kill")
        .args(["-TERM", &runner.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(wait_for_exit(&mut runner).success());

    let entries = logged(dir.path());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["label"], "A");
    assert_eq!(entries[0]["outcome"], "cancelled");
    assert_eq!(queued_labels(dir.path()), ["B"]);
}

#[test]
fn test_log_export_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    run_ok(dir.path(), &["add", "Quick", "100ms"]);
    run_ok(dir.path(), &["run", "--minimal"]);

    let path = run_ok(
        dir.path(),
        &["log", "export", "--dir", out_dir.path().to_str().unwrap()],
    );
    let path = path.trim();
    assert!(path.contains("timer-log-"));
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert!(doc["exported_at"].is_string());
    assert_eq!(doc["entries"].as_array().unwrap().len(), 1);

    assert!(run_ok(dir.path(), &["log", "clear"]).contains("cleared 1"));
    assert!(run_ok(dir.path(), &["log", "show"]).contains("no runs logged"));
}

#[test]
fn test_prefs_defaults_and_updates() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_ok(dir.path(), &["prefs", "show"]);
    assert!(out.contains("medium"));
    assert!(out.contains("notifications: off"));

    run_ok(dir.path(), &["prefs", "alert", "LOUD"]);
    run_ok(dir.path(), &["prefs", "notifications", "on"]);
    let out = run_ok(dir.path(), &["prefs", "show", "--json"]);
    let prefs: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(prefs["alert_level"], "loud");
    assert_eq!(prefs["notifications_enabled"], true);
}

#[test]
fn test_prefs_unknown_alert_level_turns_alerts_off() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["prefs", "alert", "foghorn"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("warning:"));
    assert!(stdout.contains("alert level: off"));
    assert!(run_ok(dir.path(), &["prefs", "show"]).contains("off"));
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "runner.tick_interval_ms"]).trim(),
        "100"
    );
    run_ok(dir.path(), &["config", "set", "runner.tick_interval_ms", "250"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "runner.tick_interval_ms"]).trim(),
        "250"
    );

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "runner.tick_interval_ms", "0"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);

    assert_eq!(run_ok(dir.path(), &["config", "get", "export.directory"]).trim(), "");
    run_ok(dir.path(), &["config", "set", "export.directory", "/tmp/timer-logs"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "export.directory"]).trim(),
        "/tmp/timer-logs"
    );

    run_ok(dir.path(), &["config", "reset"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "runner.tick_interval_ms"]).trim(),
        "100"
    );
}
