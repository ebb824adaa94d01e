use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Command isolated from the caller's env, `.env` and `config.toml`
fn infopost(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("infopost");
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("GEMINI_API_KEY")
        .env_remove("BSKY_USERNAME")
        .env_remove("BSKY_PASSWORD")
        .env_remove("INFOPOST__GENERAL__DRY_RUN");
    cmd
}

#[test]
fn help_lists_run_flags() {
    let dir = TempDir::new().expect("temp dir");

    infopost(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--once"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn missing_gemini_key_fails_at_startup() {
    let dir = TempDir::new().expect("temp dir");

    infopost(&dir)
        .args(["--once", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn missing_bluesky_credentials_fail_outside_dry_run() {
    let dir = TempDir::new().expect("temp dir");

    infopost(&dir)
        .env("INFOPOST__LLM__PROVIDER", "stub")
        .arg("--once")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BSKY_USERNAME"));
}

#[test]
fn stub_dry_run_completes_one_cycle() {
    let dir = TempDir::new().expect("temp dir");

    infopost(&dir)
        .env("INFOPOST__LLM__PROVIDER", "stub")
        .args(["--once", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("DRY RUN"))
        .stderr(predicate::str::contains("Offline mode"));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");

    infopost(&dir)
        .args(["--config", "does-not-exist.toml", "--once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn config_file_post_length_is_validated() {
    let dir = TempDir::new().expect("temp dir");
    let config = toml::toml! {
        [general]
        max_post_length = 400

        [llm]
        provider = "stub"
    };
    fs::write(
        dir.path().join("config.toml"),
        toml::to_string(&config).expect("serialize config"),
    )
    .expect("write config");

    infopost(&dir)
        .args(["--once", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds the Bluesky limit"));
}

#[test]
fn example_config_loads() {
    let dir = TempDir::new().expect("temp dir");
    let example = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config.example.toml");

    infopost(&dir)
        .env("INFOPOST__LLM__PROVIDER", "stub")
        .arg("--config")
        .arg(&example)
        .args(["--once", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Starting infopost"));
}
