//! CLI integration tests
//!
//! Tests for the command-line interface using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Configuration validation
//! - CLI and environment overrides
//! - Error handling for broken files

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get a command for the solace-exporter binary
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd =
        Command::cargo_bin("solace-exporter").expect("Failed to find solace-exporter binary");
    for var in [
        "SOLACE_CONFIG",
        "SOLACE_LISTEN_ADDR",
        "SOLACE_SCRAPE_URI",
        "SOLACE_USERNAME",
        "SOLACE_PASSWORD",
        "SOLACE_TIMEOUT_MS",
        "SOLACE_SSL_VERIFY",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a temporary config file with given content
fn create_temp_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file.flush().expect("Failed to flush");
    file
}

const VALID_CONFIG: &str = r#"
listen_addr: "127.0.0.1:19628"
scrape:
  uri: "http://localhost:8080"
  timeout_ms: 2000
semp_auth:
  scheme: basic
  username: admin
  password: admin
endpoints:
  std:
    - "Version=*|*"
    - "VpnStats=default|*"
"#;

/// Test --help flag displays usage information
#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--scrape-uri"));
}

/// Test -h short flag also works
#[test]
fn test_help_short_flag() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("solace-exporter"));
}

/// Test --version flag displays version
#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_validate_valid_config() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_validate_bad_yaml() {
    let file = create_temp_config("scrape:\n  uri: [not valid yaml\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .timeout(std::time::Duration::from_millis(2000))
        .assert()
        .failure();
}

#[test]
fn test_validate_bad_data_source() {
    let config = r#"
semp_auth:
  username: admin
  password: admin
endpoints:
  std:
    - "VpnStats=onlyone"
"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure();
}

/// Neither Basic nor OAuth credentials are configured
#[test]
fn test_validate_missing_credentials() {
    let file = create_temp_config("listen_addr: \"127.0.0.1:19629\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("either Basic Auth or OAuth"));
}

#[test]
fn test_cli_credentials_complete_config() {
    let file = create_temp_config("listen_addr: \"127.0.0.1:19630\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--username")
        .arg("admin")
        .arg("--password")
        .arg("secret")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_env_credentials_complete_config() {
    let file = create_temp_config("listen_addr: \"127.0.0.1:19631\"\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .env("SOLACE_USERNAME", "admin")
        .env("SOLACE_PASSWORD", "secret")
        .arg("--validate")
        .assert()
        .success();
}

#[test]
fn test_invalid_scrape_uri_override() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--scrape-uri")
        .arg("not a url")
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scrape uri"));
}

#[test]
fn test_zero_timeout_rejected() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--timeout-ms")
        .arg("0")
        .arg("--validate")
        .assert()
        .failure();
}

/// Test that log options can be set via CLI
#[test]
fn test_log_arguments() {
    let file = create_temp_config(VALID_CONFIG);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--log-level")
        .arg("debug")
        .arg("--log-format")
        .arg("json")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

/// TLS enabled without certificate material fails before binding
#[test]
fn test_tls_without_certificate_rejected() {
    let config = format!("{}tls:\n  enable: true\n  cert_type: pem\n", VALID_CONFIG);
    let file = create_temp_config(&config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .timeout(std::time::Duration::from_millis(2000))
        .assert()
        .failure();
}
