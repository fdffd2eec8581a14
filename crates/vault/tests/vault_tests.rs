//! Vault fetcher and token renewal against a mock Vault server.

use cfgvault_secrets::{
    ConfigResolver, ResolutionRequest, SecretError, SecretFetcher, SecretPath, SecureSecret,
};
use cfgvault_vault::{TokenRenewer, VaultConfig, VaultError, VaultFetcher};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "s.test-token";

fn config(server: &MockServer) -> VaultConfig {
    VaultConfig::new(&server.uri()).unwrap().with_token(TOKEN)
}

fn kv2_body(data: serde_json::Value) -> serde_json::Value {
    json!({
        "request_id": "0f1e",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": {
            "data": data,
            "metadata": { "version": 1, "destroyed": false }
        }
    })
}

async fn requests_to(server: &MockServer, endpoint: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

async fn wait_for_requests(server: &MockServer, endpoint: &str, count: usize) -> bool {
    for _ in 0..100 {
        if requests_to(server, endpoint).await >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

// ============================================================================
// Fetching
// ============================================================================

#[tokio::test]
async fn fetches_kv2_record_with_token_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/postgres"))
        .and(header("X-Vault-Token", TOKEN))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv2_body(json!({ "username": "app", "password": "s3cr3t" }))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = VaultFetcher::new(&config(&server)).unwrap();
    assert_eq!(fetcher.mode_name(), "http");

    let record = fetcher
        .fetch(&SecretPath::new("secret/data/postgres"))
        .await
        .unwrap();
    assert_eq!(record.len(), 2);
    assert_eq!(record.get("password").map(SecureSecret::expose), Some("s3cr3t"));
    assert_eq!(record.lease(), None);
}

#[tokio::test]
async fn leading_slash_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/app"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "t" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = VaultFetcher::new(&config(&server)).unwrap();
    let record = fetcher.fetch(&SecretPath::new("/secret/app")).await.unwrap();
    assert!(record.contains_key("token"));
}

#[tokio::test]
async fn sends_namespace_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/app"))
        .and(header("X-Vault-Namespace", "team-a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "token": "t" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = VaultFetcher::new(&config(&server).with_namespace("team-a")).unwrap();
    assert!(fetcher.fetch(&SecretPath::new("secret/app")).await.is_ok());
}

#[tokio::test]
async fn dynamic_secret_reports_lease() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/database/creds/app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_id": "database/creds/app/h7s9",
            "lease_duration": 3600,
            "renewable": true,
            "data": { "username": "v-app-1", "password": "generated" }
        })))
        .mount(&server)
        .await;

    let fetcher = VaultFetcher::new(&config(&server)).unwrap();
    let record = fetcher
        .fetch(&SecretPath::new("database/creds/app"))
        .await
        .unwrap();
    assert_eq!(record.lease(), Some(Duration::from_secs(3600)));
}

#[tokio::test]
async fn status_codes_map_to_error_taxonomy() {
    let server = MockServer::start().await;
    for (endpoint, status, errors) in [
        ("/v1/secret/missing", 404, json!([])),
        ("/v1/secret/bad", 400, json!(["invalid path for a versioned K/V secrets engine"])),
        ("/v1/secret/denied", 403, json!(["permission denied"])),
        ("/v1/secret/broken", 500, json!(["internal error"])),
    ] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "errors": errors })))
            .mount(&server)
            .await;
    }

    let fetcher = VaultFetcher::new(&config(&server)).unwrap();

    let err = fetcher.fetch(&SecretPath::new("secret/missing")).await.unwrap_err();
    assert!(matches!(err, SecretError::NotFound { .. }));

    let err = fetcher.fetch(&SecretPath::new("secret/bad")).await.unwrap_err();
    match err {
        SecretError::InvalidPath { reason, .. } => assert!(reason.contains("K/V")),
        other => panic!("expected InvalidPath, got {other:?}"),
    }

    let err = fetcher.fetch(&SecretPath::new("secret/denied")).await.unwrap_err();
    assert!(matches!(err, SecretError::Fetch { .. }));
    assert!(err.to_string().contains("permission denied"));

    let err = fetcher.fetch(&SecretPath::new("secret/broken")).await.unwrap_err();
    assert!(matches!(err, SecretError::Fetch { .. }));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn unreachable_server_is_fetch_error() {
    // Bind and release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = VaultConfig::new(&format!("http://127.0.0.1:{port}"))
        .unwrap()
        .with_token(TOKEN)
        .with_connect_timeout(Duration::from_millis(500));

    let fetcher = VaultFetcher::new(&config).unwrap();
    let err = fetcher.fetch(&SecretPath::new("secret/app")).await.unwrap_err();
    assert!(matches!(err, SecretError::Fetch { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn slow_response_times_out_as_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "token": "t" } }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = config(&server).with_request_timeout(Duration::from_millis(200));
    let fetcher = VaultFetcher::new(&config).unwrap();

    let err = fetcher.fetch(&SecretPath::new("secret/slow")).await.unwrap_err();
    assert!(matches!(err, SecretError::Fetch { .. }));
}

#[tokio::test]
async fn resolver_reads_each_vault_path_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(kv2_body(json!({ "user": "u", "pass": "p" }))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/database/creds/b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_id": "database/creds/b/x1",
            "lease_duration": 120,
            "data": { "token": "t" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = VaultFetcher::new(&config(&server)).unwrap();
    let resolver = ConfigResolver::new(Arc::new(fetcher));
    let request = ResolutionRequest::new()
        .with("secret/data/a", "user")
        .with("secret/data/a", "pass")
        .with("database/creds/b", "token");

    let result = resolver.resolve(&request).await.unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.get("secret/data/a", "pass").map(SecureSecret::expose), Some("p"));
    assert_eq!(result.min_lease(), Some(Duration::from_secs(120)));
}

#[tokio::test]
async fn error_never_echoes_secret_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/data/app"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(kv2_body(json!({ "password": "hunter2-value" }))),
        )
        .mount(&server)
        .await;

    let fetcher = VaultFetcher::new(&config(&server)).unwrap();
    let resolver = ConfigResolver::new(Arc::new(fetcher));
    let err = resolver
        .resolve(&ResolutionRequest::new().with("secret/data/app", "username"))
        .await
        .unwrap_err();

    assert!(matches!(err, SecretError::MissingKey { .. }));
    assert!(!format!("{err} {err:?}").contains("hunter2-value"));
}

#[tokio::test]
async fn undecodable_response_is_not_echoed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/flat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_id": "",
            "lease_duration": 0,
            "data": "hunter2-value"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/lease"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_duration": "hunter2-value",
            "data": {}
        })))
        .mount(&server)
        .await;

    let fetcher = VaultFetcher::new(&config(&server)).unwrap();
    for secret in ["secret/flat", "secret/lease"] {
        let err = fetcher.fetch(&SecretPath::new(secret)).await.unwrap_err();
        let rendered = format!("{err} {err:?}");

        assert!(matches!(err, SecretError::Fetch { .. }));
        assert!(rendered.contains("could not be decoded"), "{rendered}");
        assert!(!rendered.contains("hunter2-value"), "{rendered}");
    }
}

// ============================================================================
// CLI mode
// ============================================================================

#[cfg(unix)]
mod cli_mode {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_vault(dir: &tempfile::TempDir, script: &str) -> std::path::PathBuf {
        let program = dir.path().join("vault");
        std::fs::write(&program, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        program
    }

    #[tokio::test]
    async fn reads_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_vault(
            &dir,
            r#"[ "$1" = "read" ] && [ "$2" = "-format=json" ] || exit 9
echo '{"lease_id":"","lease_duration":0,"data":{"data":{"token":"cli-t"},"metadata":{"version":2}}}'"#,
        );

        let fetcher = VaultFetcher::cli().with_cli_program(program);
        assert_eq!(fetcher.mode_name(), "cli");

        let record = fetcher
            .fetch(&SecretPath::new("secret/data/app"))
            .await
            .unwrap();
        assert_eq!(record.get("token").map(SecureSecret::expose), Some("cli-t"));
        assert_eq!(record.lease(), None);
    }

    #[tokio::test]
    async fn missing_value_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_vault(&dir, r#"echo "No value found at $3" >&2; exit 2"#);

        let fetcher = VaultFetcher::cli().with_cli_program(program);
        let err = fetcher
            .fetch(&SecretPath::new("secret/data/app"))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::NotFound { .. }));
    }

    #[tokio::test]
    async fn undecodable_output_is_not_echoed() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_vault(&dir, r#"echo '{"data":"cli-leak"}'"#);

        let fetcher = VaultFetcher::cli().with_cli_program(program);
        let err = fetcher
            .fetch(&SecretPath::new("secret/app"))
            .await
            .unwrap_err();
        let rendered = format!("{err} {err:?}");
        assert!(matches!(err, SecretError::Fetch { .. }));
        assert!(rendered.contains("line 1"), "{rendered}");
        assert!(!rendered.contains("cli-leak"), "{rendered}");
    }

    #[tokio::test]
    async fn other_failures_are_fetch_errors() {
        let dir = tempfile::tempdir().unwrap();
        let program = fake_vault(&dir, r#"echo "permission denied" >&2; exit 2"#);

        let fetcher = VaultFetcher::cli().with_cli_program(program);
        let err = fetcher
            .fetch(&SecretPath::new("secret/data/app"))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::Fetch { .. }));
        assert!(err.to_string().contains("permission denied"));
    }
}

// ============================================================================
// Token renewal
// ============================================================================

fn lookup_body(ttl: u64, renewable: bool) -> serde_json::Value {
    json!({ "data": { "ttl": ttl, "renewable": renewable, "policies": ["default"] } })
}

#[tokio::test]
async fn non_renewable_token_does_not_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_body(3600, false)))
        .expect(1)
        .mount(&server)
        .await;

    let renewer = TokenRenewer::new(&config(&server)).unwrap();
    assert!(renewer.start().await.unwrap().is_none());
}

#[tokio::test]
async fn forbidden_lookup_is_invalid_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "errors": ["permission denied"] })),
        )
        .mount(&server)
        .await;

    let result = TokenRenewer::new(&config(&server)).unwrap().start().await;
    assert!(matches!(result, Err(VaultError::InvalidToken { .. })));
}

#[tokio::test]
async fn other_lookup_failure_is_lookup_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = TokenRenewer::new(&config(&server)).unwrap().start().await;
    assert!(matches!(result, Err(VaultError::TokenLookup { .. })));
}

#[tokio::test]
async fn renewable_token_is_renewed_until_shutdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_body(2, true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/renew-self"))
        .and(header("X-Vault-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth": { "client_token": TOKEN, "lease_duration": 2, "renewable": true }
        })))
        .mount(&server)
        .await;

    let handle = TokenRenewer::new(&config(&server))
        .unwrap()
        .start()
        .await
        .unwrap()
        .unwrap();

    assert!(wait_for_requests(&server, "/v1/auth/token/renew-self", 2).await);
    assert!(!handle.is_finished());

    handle.shutdown().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let renewals = requests_to(&server, "/v1/auth/token/renew-self").await;
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(requests_to(&server, "/v1/auth/token/renew-self").await, renewals);
}

#[tokio::test]
async fn failed_renewal_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_body(2, true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/renew-self"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "errors": ["boom"] })))
        .mount(&server)
        .await;

    let handle = TokenRenewer::new(&config(&server))
        .unwrap()
        .with_retry_delay(Duration::from_millis(100))
        .start()
        .await
        .unwrap()
        .unwrap();

    assert!(wait_for_requests(&server, "/v1/auth/token/renew-self", 3).await);
    assert!(!handle.is_finished());
    handle.shutdown().await;
}

#[tokio::test]
async fn dropping_handle_stops_renewal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_body(2, true)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token/renew-self"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "auth": { "lease_duration": 2 }
        })))
        .mount(&server)
        .await;

    let handle = TokenRenewer::new(&config(&server))
        .unwrap()
        .start()
        .await
        .unwrap()
        .unwrap();
    drop(handle);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(requests_to(&server, "/v1/auth/token/renew-self").await, 0);
}
