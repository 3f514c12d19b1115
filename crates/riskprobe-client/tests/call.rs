// crates/riskprobe-client/tests/call.rs
// ============================================================================
// Module: Client Call Tests
// Description: Single-attempt calls against the in-process mock.
// Purpose: Verify status capture, timeouts, and connection failures.
// ============================================================================

//! Client call tests.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::collections::BTreeMap;
use std::net::TcpListener;
use std::time::Duration;

use riskprobe_client::ModelClient;
use riskprobe_client::TransportError;
use riskprobe_config::HarnessConfig;
use riskprobe_core::scenarios;
use riskprobe_mock::MockBehavior;
use riskprobe_mock::spawn_mock;
use serde_json::json;
use url::Url;

fn client_for(endpoint: &str, timeout: Duration) -> ModelClient {
    ModelClient::new(Url::parse(endpoint).unwrap(), timeout).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn captures_success_and_validation_statuses() {
    let mock = spawn_mock(MockBehavior::default()).unwrap();
    let client = client_for(&mock.endpoint(), Duration::from_secs(5));

    let call = client.call_payload(&scenarios::canonical_request().into()).await.unwrap();
    assert_eq!(call.status, 200);
    assert!(call.is_success());
    assert_eq!(call.body.as_ref().unwrap()["class"], "elevated_risk");
    assert!(call.elapsed_ms() > 0.0);

    let call = client.call_model(&json!({ "age": 40 })).await.unwrap();
    assert_eq!(call.status, 422);
    assert!(!call.is_success());
    assert!(call.raw_body.contains("patient_id"));
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_endpoint_times_out_without_retry() {
    let mock = spawn_mock(MockBehavior::default().with_delay(Duration::from_millis(600))).unwrap();
    let client = client_for(&mock.endpoint(), Duration::from_millis(150));
    let err = client.call_model(&json!({ "patient_id": "pt-1" })).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)), "{err}");
    assert_eq!(mock.requests_served(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_endpoint_is_connect_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client_for(&format!("http://127.0.0.1:{port}/v1/model/infer"), Duration::from_secs(2));
    let (trace, result) = client.traced_call(json!({ "patient_id": "pt-1" })).await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
    assert!(trace.status.is_none());
    assert!(trace.error.is_some());
}

#[test]
fn builds_from_config() {
    let config = HarnessConfig::load_with(None, &BTreeMap::<String, String>::new())
        .unwrap()
        .with_model_url("http://127.0.0.1:9");
    let client = ModelClient::from_config(&config).unwrap();
    assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:9/v1/model/infer");
    assert_eq!(client.timeout(), config.request_timeout());
}
