//! End-to-end tests for the cfgvault binary using the file backend.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const SECRETS: &str = r#"{
    "secret/data/postgres": {
        "data": { "username": "app", "password": "s3cr3t-pw" },
        "lease_seconds": 300
    },
    "database/creds/app": {
        "data": { "token": "dyn-token" },
        "lease_seconds": 120
    },
    "secret/data/static": {
        "data": { "flag": true }
    }
}"#;

fn secrets_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SECRETS.as_bytes()).unwrap();
    file
}

fn cfgvault(secrets: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("cfgvault").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("CFGVAULT_BACKEND", "file")
        .env("CFGVAULT_SECRETS_FILE", secrets.path());
    cmd
}

#[test]
fn resolve_redacts_values_and_reports_min_lease() {
    let secrets = secrets_file();
    cfgvault(&secrets)
        .args([
            "resolve",
            "secret/data/postgres:username",
            "secret/data/postgres:password",
            "database/creds/app:token",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "secret/data/postgres:password=[REDACTED]",
        ))
        .stdout(predicate::str::contains(
            "# min lease: 120s, refresh after: 60s",
        ))
        .stdout(predicate::str::contains("s3cr3t-pw").not());
}

#[test]
fn resolve_reveal_prints_values() {
    let secrets = secrets_file();
    cfgvault(&secrets)
        .args(["resolve", "--reveal", "secret/data/postgres:password"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "secret/data/postgres:password=s3cr3t-pw",
        ));
}

#[test]
fn resolve_without_lease() {
    let secrets = secrets_file();
    cfgvault(&secrets)
        .args(["resolve", "--reveal", "secret/data/static:flag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret/data/static:flag=true"))
        .stdout(predicate::str::contains("# no lease reported"));
}

#[test]
fn resolve_json_envelope() {
    let secrets = secrets_file();
    let output = cfgvault(&secrets)
        .args([
            "--json",
            "resolve",
            "secret/data/postgres:username",
            "database/creds/app:token",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["data"]["min_lease_secs"], 120);
    assert_eq!(json["data"]["values"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"]["values"][1]["path"], "database/creds/app");
}

#[test]
fn missing_key_exits_with_resolution_code() {
    let secrets = secrets_file();
    cfgvault(&secrets)
        .args([
            "resolve",
            "secret/data/postgres:username",
            "secret/data/postgres:sslcert",
        ])
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("sslcert"))
        .stderr(predicate::str::contains("s3cr3t-pw").not());
}

#[test]
fn unknown_path_exits_with_resolution_code() {
    let secrets = secrets_file();
    cfgvault(&secrets)
        .args(["resolve", "secret/data/unknown:key"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("secret/data/unknown"));
}

#[test]
fn malformed_reference_exits_with_usage_code() {
    let secrets = secrets_file();
    cfgvault(&secrets)
        .args(["resolve", "no-key-here"])
        .assert()
        .code(2);
}

#[test]
fn json_error_envelope() {
    let secrets = secrets_file();
    let output = cfgvault(&secrets)
        .args(["--json", "resolve", "secret/data/postgres:nope"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], "resolve");
}

#[test]
fn file_backend_without_file_is_usage_error() {
    Command::cargo_bin("cfgvault")
        .unwrap()
        .env_remove("CFGVAULT_SECRETS_FILE")
        .args(["--backend", "file", "resolve", "secret/app:key"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--secrets-file"));
}

#[test]
fn scan_resolves_references_in_file() {
    let secrets = secrets_file();
    let mut config = NamedTempFile::new().unwrap();
    write!(
        config,
        "db.user=${{vault:secret/data/postgres:username}}\n\
         db.pass=${{vault:secret/data/postgres:password}}\n\
         api.token=${{other:database/creds/app:token}}\n\
         plain=value\n"
    )
    .unwrap();

    cfgvault(&secrets)
        .args(["scan", "--reveal"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("secret/data/postgres:username=app"))
        .stdout(predicate::str::contains("database/creds/app").not())
        .stdout(predicate::str::contains("# min lease: 300s"));
}

#[test]
fn scan_list_only_does_not_resolve() {
    let mut config = NamedTempFile::new().unwrap();
    write!(
        config,
        "a=${{vault:secret/one:k}}\nb=${{vault:secret/two:k}}\nc=${{vault:secret/one:k}}\n"
    )
    .unwrap();

    // No secrets file: listing must not touch the backend
    Command::cargo_bin("cfgvault")
        .unwrap()
        .env_remove("CFGVAULT_SECRETS_FILE")
        .args(["--backend", "file", "scan", "--list-only"])
        .arg(config.path())
        .assert()
        .success()
        .stdout("secret/one:k\nsecret/two:k\n");
}

#[test]
fn scan_custom_provider() {
    let secrets = secrets_file();
    let mut config = NamedTempFile::new().unwrap();
    write!(config, "token=${{other:database/creds/app:token}}\n").unwrap();

    cfgvault(&secrets)
        .args(["scan", "--provider", "other"])
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("database/creds/app:token=[REDACTED]"));
}

#[test]
fn scan_missing_file_is_usage_error() {
    let secrets = secrets_file();
    cfgvault(&secrets)
        .args(["scan", "/nonexistent/app.properties"])
        .assert()
        .code(2);
}

#[test]
fn version_prints_package() {
    Command::cargo_bin("cfgvault")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("cfgvault "));
}
