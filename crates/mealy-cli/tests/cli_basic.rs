//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary `MEALY_HOME`
//! using the offline demo household, so no server or keyring is needed.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_mealy-cli"))
        .args(args)
        .env("MEALY_HOME", home)
        .env_remove("MEALY_TOKEN")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn run_json(home: &Path, args: &[&str]) -> serde_json::Value {
    let (code, stdout, stderr) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is not JSON")
}

#[test]
fn test_status_offline() {
    let home = tempfile::tempdir().unwrap();
    let status = run_json(home.path(), &["--offline", "status"]);
    assert!(status["period"] == "lunch" || status["period"] == "dinner");
    assert_eq!(status["view"]["waiting"].as_array().unwrap().len(), 4);
    assert_eq!(status["me"]["_id"], "asha");
}

#[test]
fn test_eat_persists_between_runs() {
    let home = tempfile::tempdir().unwrap();
    let view = run_json(home.path(), &["--offline", "eat"]);
    assert_eq!(view["eaten"].as_array().unwrap().len(), 1);

    let (code, _, stderr) = run_cli(home.path(), &["--offline", "eat"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("already"), "unexpected error: {stderr}");
}

#[test]
fn test_away_blocks_eating() {
    let home = tempfile::tempdir().unwrap();
    let view = run_json(home.path(), &["--offline", "away"]);
    assert_eq!(view["away"].as_array().unwrap().len(), 1);

    let (code, _, stderr) = run_cli(home.path(), &["--offline", "eat"]);
    assert_ne!(code, 0);
    assert!(stderr.starts_with("error:"));
}

#[test]
fn test_finished_then_undo() {
    let home = tempfile::tempdir().unwrap();
    let summary = run_json(home.path(), &["--offline", "finished"]);
    assert_eq!(summary["missed"].as_array().unwrap().len(), 4);
    assert_eq!(summary["ranking"].as_array().unwrap().len(), 4);

    let (code, _, _) = run_cli(home.path(), &["--offline", "finished"]);
    assert_ne!(code, 0, "second report in the same period must fail");

    run_json(home.path(), &["--offline", "undo"]);
    let status = run_json(home.path(), &["--offline", "status"]);
    assert_eq!(status["food_finished"], false);
}

#[test]
fn test_reconcile_second_run_starts_from_first() {
    let home = tempfile::tempdir().unwrap();
    let first = run_json(home.path(), &["--offline", "reconcile"]);
    assert_eq!(first["outcome"], "transitioned");
    assert_eq!(first["from"], "none");

    // Runs on the wall clock: a period boundary may fall between the two
    // runs, in which case the second one must start from the first's result.
    let second = run_json(home.path(), &["--offline", "reconcile"]);
    match second["outcome"].as_str() {
        Some("unchanged") => assert_eq!(second["period"], first["to"]),
        Some("transitioned") => {
            assert_eq!(second["from"], first["to"]);
            assert_ne!(second["to"], first["to"]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_config_set_get_roundtrip() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "poller.fetch_interval_secs", "15"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(home.path(), &["config", "get", "poller.fetch_interval_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "15");
}

#[test]
fn test_config_rejects_bad_values() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "schedule.lunch_start_hour", "24"]);
    assert_ne!(code, 0);
    let (code, _, _) = run_cli(home.path(), &["config", "get", "nope.nothing"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_show_is_toml() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0, "{stderr}");
    let config: toml::Value = toml::from_str(&stdout).expect("stdout is not TOML");
    assert_eq!(
        config["remote"]["base_url"].as_str(),
        Some("https://mealyby-ayush.vercel.app")
    );
    assert_eq!(config["schedule"]["dinner_start_hour"].as_integer(), Some(21));

    let (code, stdout, _) = run_cli(home.path(), &["config", "show", "poller"]);
    assert_eq!(code, 0);
    let poller: toml::Value = toml::from_str(&stdout).unwrap();
    assert_eq!(poller["fetch_interval_secs"].as_integer(), Some(30));
    assert!(poller.get("remote").is_none());

    let (code, _, _) = run_cli(home.path(), &["config", "show", "nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_set_echoes_and_path_points_into_home() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "set", "poller.reconcile_interval_secs", "045"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "poller.reconcile_interval_secs = 45");

    let (code, stdout, _) = run_cli(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    let path = std::path::PathBuf::from(stdout.trim());
    assert!(path.starts_with(home.path()), "{} not under MEALY_HOME", path.display());
    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains("reconcile_interval_secs = 45"));
}
