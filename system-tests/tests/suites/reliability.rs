// system-tests/tests/suites/reliability.rs
// ============================================================================
// Module: Reliability System Tests
// Description: Transport failures, ordering, config layering, and reports.
// Purpose: Verify failures are recorded not retried and runs are repeatable.
// Dependencies: riskprobe-client, riskprobe-config, riskprobe-suites, helpers
// ============================================================================

//! ## Overview
//! Covers the plumbing around the assertions: unreachable endpoints, the
//! single-attempt client, order independence, layered configuration, and
//! the canonical report artifact.

use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use riskprobe_client::ModelClient;
use riskprobe_client::TransportError;
use riskprobe_config::HarnessConfig;
use riskprobe_core::Tag;
use riskprobe_core::scenarios::canonical_request;
use riskprobe_mock::MockBehavior;
use riskprobe_suites::TestCase;
use riskprobe_suites::run_cases;
use riskprobe_suites::run_selected;
use riskprobe_suites::select;
use serde_json::Value;
use tempfile::TempDir;

use crate::helpers::artifacts::write_and_read;
use crate::helpers::harness::compliant_session;
use crate::helpers::harness::mock_config;
use crate::helpers::harness::mock_session;
use crate::helpers::harness::session_for;

fn compliance_cases(tag: Tag) -> Vec<TestCase> {
    select(&mock_config().performance, &[tag])
        .into_iter()
        .filter(|case| !case.is_performance())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_endpoint_fails_every_case_without_hanging() {
    let mut config = mock_config().with_model_url("http://127.0.0.1:9");
    config.use_mock = false;
    config.request_timeout_s = 2;
    let session = session_for(&config);
    let report = run_selected(&session, &[Tag::P0]).await;
    assert!(!report.used_mock);
    assert_eq!(report.totals.passed, 0);
    for outcome in &report.outcomes {
        let trace = outcome.traces().first().unwrap();
        assert_eq!(trace.status, None);
        assert!(trace.error.is_some());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn client_issues_exactly_one_attempt_per_call() {
    let session = mock_session(MockBehavior::default().with_fail_every(1));
    let body = serde_json::to_value(canonical_request()).unwrap();
    let call = session.client().call_model(&body).await.unwrap();
    assert_eq!(call.status, 503);
    assert_eq!(session.mock().unwrap().requests_served(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_reply_times_out_as_a_failed_call() {
    let session = mock_session(MockBehavior::default().with_delay(Duration::from_secs(3)));
    let client =
        ModelClient::new(session.client().endpoint().clone(), Duration::from_secs(1)).unwrap();
    let body = serde_json::to_value(canonical_request()).unwrap();
    let err = client.call_model(&body).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)), "{err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn verdicts_do_not_depend_on_case_order() {
    let session = compliant_session();
    let cases = compliance_cases(Tag::P1);
    let forward = run_cases(&session, &cases, &[Tag::P1]).await;
    let mut reversed_cases = cases.clone();
    reversed_cases.reverse();
    let reversed = run_cases(&session, &reversed_cases, &[Tag::P1]).await;
    for outcome in &forward.outcomes {
        let other = reversed.outcome(outcome.name()).unwrap();
        assert_eq!(outcome.passed(), other.passed(), "{}", outcome.name());
    }
}

#[test]
fn environment_overrides_config_file_and_sizes_cases() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("riskprobe.toml");
    fs::write(
        &path,
        "confidence_floor = 0.6\n\n[performance]\nload_requests = 10\nload_concurrency = 2\n",
    )
    .unwrap();
    let env: BTreeMap<String, String> =
        [("LOAD_REQUESTS".to_string(), "30".to_string())].into_iter().collect();
    let config = HarnessConfig::load_with(Some(&path), &env).unwrap();
    assert_eq!(config.confidence_floor, 0.6);
    assert_eq!(config.performance.load_concurrency, 2);
    assert_eq!(config.performance.load_requests, 30);
    let load = select(&config.performance, &[Tag::Load]);
    let case = load.iter().find(|case| case.name == "concurrent_load").unwrap();
    assert!(format!("{:?}", case.kind).contains("requests: 30"));
}

#[tokio::test(flavor = "multi_thread")]
async fn report_is_canonical_json_with_trailing_newline() {
    let session = compliant_session();
    let report = run_selected(&session, &[Tag::P0]).await;
    let written = write_and_read(&report, "p0");
    assert!(written.path.ends_with("report.json"));
    assert_eq!(written.bytes.last(), Some(&b'\n'));
    let json = written.json();
    let mut canonical = serde_jcs::to_vec(&json).unwrap();
    canonical.push(b'\n');
    assert_eq!(canonical, written.bytes);
    assert_eq!(json["totals"]["total"], Value::from(report.totals.total));
    assert_eq!(json["used_mock"], Value::Bool(true));
}
