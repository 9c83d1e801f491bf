use httpmock::prelude::*;
use lesson_gate::config::toml_config::{BackendConfig, VerificationConfig};
use lesson_gate::{CheckTimings, DebouncedCheck, RemoteVerifier};
use std::time::Duration;

/// Short real-time windows; the mock server runs on real sockets so the
/// tokio clock cannot be paused here.
fn timings() -> CheckTimings {
    CheckTimings {
        debounce: Duration::from_millis(20),
        min_interval: Duration::from_millis(200),
        freshness: Duration::from_millis(400),
    }
}

fn checker(server: &MockServer) -> DebouncedCheck<RemoteVerifier> {
    let backend = BackendConfig {
        url: server.base_url(),
        api_key: Some("anon-key".to_string()),
        timeout_seconds: 5,
    };
    let verifier = RemoteVerifier::new(&backend, &VerificationConfig::default()).unwrap();
    DebouncedCheck::with_timings(verifier, timings())
}

#[tokio::test]
async fn test_repeated_checks_hit_backend_once() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/rest/v1/profiles")
            .query_param("id", "eq.user-1");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([{"email_verified": true}]));
    });

    let checker = checker(&server);

    let (first, second) = tokio::join!(checker.check("user-1"), checker.check("user-1"));
    assert!(first && second);
    assert!(checker.check("user-1").await);

    api_mock.assert_hits(1);
    assert!(checker.cached("user-1").is_some_and(|entry| entry.verified));
}

#[tokio::test]
async fn test_expired_entry_is_refreshed() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/rest/v1/profiles");
        then.status(200)
            .json_body(serde_json::json!([{"email_verified": false}]));
    });

    let checker = checker(&server);

    assert!(!checker.check("user-1").await);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!checker.check("user-1").await);

    api_mock.assert_hits(2);
}

#[tokio::test]
async fn test_backend_failure_fails_closed_then_retries() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/rest/v1/profiles");
        then.status(500);
    });

    let checker = checker(&server);

    assert!(!checker.check("user-1").await);
    assert!(checker.cached("user-1").is_none());

    // Rate limited: answered locally.
    assert!(!checker.check("user-1").await);
    api_mock.assert_hits(1);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!checker.check("user-1").await);
    api_mock.assert_hits(2);
}
