#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn artisync(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("artisync").unwrap();
    cmd.current_dir(dir.path())
        .env("ARTISYNC_ROOT", dir.path())
        .env_remove("TOKEN_PAT")
        .env_remove("GITHUB_WORKSPACE")
        .env_remove("RUST_LOG");
    cmd
}

fn write_data(dir: &TempDir, name: &str, contents: &str) {
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join(name), contents).unwrap();
}

const SETTINGS: &str = r#"{
    "workflow": {"owner": "octo", "repo": "app", "name": "beta.yml", "branch": "dev"},
    "delay": 10
}"#;

// ---------------------------------------------------------------------------
// artisync run: startup configuration
// ---------------------------------------------------------------------------

#[test]
fn missing_token_is_fatal_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    write_data(&dir, "settings.json", SETTINGS);

    artisync(&dir)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing GitHub token"));

    assert!(!dir.path().join("data/info.json").exists());
}

#[test]
fn explicit_run_subcommand_behaves_like_default() {
    let dir = TempDir::new().unwrap();
    write_data(&dir, "settings.json", SETTINGS);

    artisync(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing GitHub token"));
}

#[test]
fn missing_settings_is_fatal() {
    let dir = TempDir::new().unwrap();

    artisync(&dir)
        .args(["--token", "ghp_test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load settings"))
        .stderr(predicate::str::contains("settings.json"));

    assert!(!dir.path().join("data/info.json").exists());
}

#[test]
fn token_from_env_gets_past_token_check() {
    let dir = TempDir::new().unwrap();

    artisync(&dir)
        .env("TOKEN_PAT", "ghp_test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load settings"));
}

#[test]
fn token_file_gets_past_token_check() {
    let dir = TempDir::new().unwrap();
    write_data(&dir, "github-token.txt", "ghp_from_file\n");

    artisync(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load settings"));
}

#[test]
fn invalid_settings_refuse_to_start() {
    let dir = TempDir::new().unwrap();
    write_data(
        &dir,
        "settings.json",
        r#"{"workflow": {"owner": "", "repo": "app", "name": "beta.yml", "branch": "dev"}}"#,
    );

    artisync(&dir)
        .args(["--token", "ghp_test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("workflow.owner must not be empty"))
        .stderr(predicate::str::contains("refusing to start"));

    assert!(!dir.path().join("data/info.json").exists());
}

#[test]
fn archive_holding_data_dir_refuses_to_start() {
    let dir = TempDir::new().unwrap();
    write_data(
        &dir,
        "settings.json",
        r#"{"workflow": {"owner": "octo", "repo": "app", "name": "beta.yml", "branch": "dev"},
            "archive": "."}"#,
    );
    write_data(&dir, "github-token.txt", "ghp_test");

    artisync(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("contains the data directory"))
        .stderr(predicate::str::contains("refusing to start"));

    assert!(dir.path().join("data/settings.json").exists());
    assert!(dir.path().join("data/github-token.txt").exists());
    assert!(!dir.path().join("data/info.json").exists());
}

// ---------------------------------------------------------------------------
// artisync state
// ---------------------------------------------------------------------------

#[test]
fn state_json_shows_persisted_record() {
    let dir = TempDir::new().unwrap();
    write_data(
        &dir,
        "info.json",
        r#"{
            "commit-log": "- Add player ~Ana",
            "status": "success",
            "elapsed-time": 42.5,
            "workflow": {"id": 11, "title": "Build 11"}
        }"#,
    );

    let out = artisync(&dir).args(["state", "--json"]).output().unwrap();
    assert!(out.status.success());

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["status"], "success");
    assert_eq!(v["commit-log"], "- Add player ~Ana");
    assert_eq!(v["elapsed-time"], 42.5);
    assert_eq!(v["workflow"]["id"], 11);
}

#[test]
fn state_without_file_is_the_zero_record() {
    let dir = TempDir::new().unwrap();

    artisync(&dir)
        .arg("state")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn state_table_lists_every_commit_line() {
    let dir = TempDir::new().unwrap();
    write_data(
        &dir,
        "info.json",
        r#"{"commit-log": "- one ~A\n- two ~B", "status": "hit rate limit"}"#,
    );

    artisync(&dir)
        .arg("state")
        .assert()
        .success()
        .stdout(predicate::str::contains("hit rate limit"))
        .stdout(predicate::str::contains("- one ~A"))
        .stdout(predicate::str::contains("- two ~B"));
}

#[test]
fn corrupt_state_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_data(&dir, "info.json", "{not json");

    artisync(&dir)
        .arg("state")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));
}
