//! Corruption recovery tests for kcal.
//!
//! These tests verify the CLI can handle:
//! - Corrupted history files
//! - Missing files
//! - Partial writes
//! - Unreadable history files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("kcal"));
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("GOOGLE_API_KEY", "test-key")
        .env("KCAL_ESTIMATOR_URL", "http://127.0.0.1:9")
        .env("KCAL_ESTIMATOR_TIMEOUT_SECS", "2");
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_history_reads_as_empty() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(data_dir.join("workouts.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted history");

    cli(temp_dir.path())
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts recorded yet"));

    cli(temp_dir.path())
        .arg("stats")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts recorded yet"));
}

#[test]
fn test_log_replaces_corrupted_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    let history_path = data_dir.join("workouts.json");
    fs::write(&history_path, "corrupted").unwrap();

    cli(temp_dir.path())
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--type", "Walking", "--duration", "30"])
        .assert()
        .success();

    // History file should now be valid and hold only the new workout
    let contents = fs::read_to_string(&history_path).expect("History should exist");
    let parsed: Vec<serde_json::Value> =
        serde_json::from_str(&contents).expect("History should be valid JSON");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0]["calories"], 120);
}

#[test]
fn test_partial_history_not_salvaged() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    // A valid record followed by a truncated one (simulating a crash mid-write)
    let mut file = fs::File::create(data_dir.join("workouts.json")).unwrap();
    write!(
        file,
        r#"[{{"id":"1","type":"Running","duration":30,"calories":300,"date":"2025-01-01T10:00:00Z","intensity":"medium"}},{{"id":"2","type":"Yo"#
    )
    .unwrap();
    drop(file);

    cli(temp_dir.path())
        .arg("export")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--format", "csv", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running").not());
}

#[test]
fn test_legacy_history_without_intensity() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(
        data_dir.join("workouts.json"),
        r#"[{"id":"1712345678901","type":"Yoga","duration":20,"calories":60,"date":"2024-04-05T19:34:38.901Z"}]"#,
    )
    .unwrap();

    cli(temp_dir.path())
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Medium"))
        .stdout(predicate::str::contains("1712345678901"));

    cli(temp_dir.path())
        .arg("export")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--format", "csv", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains(",Yoga,20,60,medium"));
}

#[test]
fn test_missing_data_dir() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("does").join("not").join("exist");

    cli(temp_dir.path())
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    // Reading never creates the slot
    assert!(!data_dir.join("workouts.json").exists());
}

#[test]
fn test_empty_history_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("workouts.json"), "").unwrap();

    cli(temp_dir.path())
        .arg("log")
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["--type", "Cycling", "--duration", "10"])
        .assert()
        .success();
}

#[test]
fn test_permission_denied_history() {
    // Skip on Windows (permission model is different)
    if cfg!(windows) {
        return;
    }

    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let history_path = data_dir.join("workouts.json");
    fs::write(&history_path, "[]").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&history_path).unwrap().permissions();
        perms.set_mode(0o000); // No permissions
        fs::set_permissions(&history_path, perms).unwrap();

        // Unreadable history degrades to empty rather than failing
        cli(temp_dir.path())
            .arg("stats")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();

        // Clean up permissions for temp dir cleanup
        let mut perms = fs::metadata(&history_path).unwrap().permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&history_path, perms).unwrap();
    }
}
