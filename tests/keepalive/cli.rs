use crate::common::{
    mock_build_instance, mock_delete, mock_workflows, COMPUTE_PATH, METADATA_PATH, PIPELINE_PATH,
};
use assert_cmd::Command;
use gcp_keepalive::config::CONFIG_PATH_ENV;
use httpmock::MockServer;
use predicates::prelude::predicate;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const BINARY: &str = "gcp-keepalive";

fn write_config(dir: &TempDir, server: &MockServer) -> PathBuf {
    let path = dir.path().join("config.yaml");
    let content = format!(
        r#"
log:
  level: debug
poll_interval: 10ms
metadata:
  endpoint: {}
pipeline:
  endpoint: {}
terminator:
  method: api
  compute_endpoint: {}
"#,
        server.url(METADATA_PATH),
        server.url(PIPELINE_PATH),
        server.url(COMPUTE_PATH)
    );
    fs::write(&path, content).unwrap();
    path
}

fn cmd_with_config_file(config_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin(BINARY).unwrap();
    cmd.env(CONFIG_PATH_ENV, config_path)
        .env_remove("LOG_LEVEL")
        .timeout(Duration::from_secs(30));
    cmd
}

#[test]
fn print_version() {
    let mut cmd = Command::cargo_bin(BINARY).unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("GCP keepalive Version:"));
}

#[test]
fn print_debug_info() {
    let mut cmd = Command::cargo_bin(BINARY).unwrap();
    cmd.arg("--print-debug-info")
        .env(CONFIG_PATH_ENV, "/custom/keepalive.yaml");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("/custom/keepalive.yaml"));
}

#[test]
fn invalid_configuration_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "poll_interval: sometimes\n").unwrap();

    cmd_with_config_file(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error on gcp-keepalive initialization"));
}

#[test]
fn finished_pipeline_exits_successfully() {
    let server = MockServer::start();
    mock_build_instance(&server);
    mock_workflows(&server, 200, r#"{"items": [{"status": "failed"}]}"#);
    let delete = mock_delete(&server, 200);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &server);

    cmd_with_config_file(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline is no longer running"))
        .stdout(predicate::str::contains("gcp-keepalive exited successfully"));

    delete.assert();
}

#[test]
fn unreachable_pipeline_exits_with_failure() {
    let server = MockServer::start();
    mock_build_instance(&server);
    mock_workflows(&server, 500, "");
    let delete = mock_delete(&server, 200);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &server);

    cmd_with_config_file(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("gcp-keepalive exited with an error"));

    delete.assert_calls(0);
}
