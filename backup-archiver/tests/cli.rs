//! Command-line behaviour of the `backup-archiver` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn archiver() -> Command {
    let mut cmd = Command::cargo_bin("backup-archiver").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn archives_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("backup_") && n.ends_with(".zip"))
        .collect();
    names.sort();
    names
}

#[test]
fn test_create_reports_archive_path() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("notes.txt"), b"hello").unwrap();

    archiver()
        .arg("create")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup created:"))
        .stdout(predicate::str::contains("_v1.zip"));

    let archives = archives_in(temp_dir.path());
    assert_eq!(archives.len(), 1);
    assert!(archives[0].ends_with("_v1.zip"));
}

#[test]
fn test_default_command_backs_up_current_directory() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("notes.txt"), b"hello").unwrap();
    fs::write(temp_dir.path().join("backup_2024.01.01_10.00_v4.zip"), b"").unwrap();

    archiver()
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("_v5.zip"));

    assert_eq!(archives_in(temp_dir.path()).len(), 2);
}

#[test]
fn test_create_missing_root_fails() {
    let temp_dir = TempDir::new().unwrap();

    archiver()
        .arg("create")
        .arg(temp_dir.path().join("missing"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Backup failed"));
}

#[test]
fn test_pause_waits_for_enter() {
    let temp_dir = TempDir::new().unwrap();

    archiver()
        .args(["create", "--pause", "--no-lock"])
        .arg(temp_dir.path())
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Press Enter to exit"));
}

#[test]
fn test_list_json() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("backup_2024.01.01_10.00_v3.zip"), b"").unwrap();
    fs::write(temp_dir.path().join("backup_2024.01.02_10.00_v10abc.zip"), b"").unwrap();

    let output = archiver()
        .args(["list", "--json"])
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["next_version"], 11);
    assert_eq!(report["archives"].as_array().unwrap().len(), 2);
    assert_eq!(report["archives"][0]["version"], 3);
}

#[test]
fn test_list_table() {
    let temp_dir = TempDir::new().unwrap();

    archiver()
        .arg("list")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No archives"))
        .stdout(predicate::str::contains("Next version: 1"));
}

#[test]
fn test_config_file_and_env_override() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("archiver.toml");
    fs::write(&config_path, "[archive]\ncompression = \"stored\"\n").unwrap();

    archiver()
        .arg("--config")
        .arg(&config_path)
        .arg("config")
        .env("BACKUP_ARCHIVER_LOG__LEVEL", "debug")
        .assert()
        .success()
        .stdout(predicate::str::contains("compression = \"stored\""))
        .stdout(predicate::str::contains("level = \"debug\""));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("archiver.toml");
    fs::write(&config_path, "[archive]\ncompression_level = 42\n").unwrap();

    archiver()
        .arg("--config")
        .arg(&config_path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("compression level 42"));
}
