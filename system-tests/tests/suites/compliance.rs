// system-tests/tests/suites/compliance.rs
// ============================================================================
// Module: Compliance System Tests
// Description: Full catalog runs against the compliant mock.
// Purpose: Prove every shipped case passes against a contract-honoring API.
// Dependencies: riskprobe-suites, helpers
// ============================================================================

//! ## Overview
//! Runs the catalog end to end the way `riskprobe run` does and checks the
//! verdict, the tag partition, and the recorded benchmarks.

use std::collections::BTreeSet;

use riskprobe_core::Tag;
use riskprobe_suites::catalog;
use riskprobe_suites::run_selected;
use riskprobe_suites::select;

use crate::helpers::harness::compliant_session;
use crate::helpers::harness::live_config;
use crate::helpers::harness::mock_config;
use crate::helpers::harness::session_for;

#[tokio::test(flavor = "multi_thread")]
async fn full_catalog_passes_against_compliant_mock() {
    let session = compliant_session();
    let report = run_selected(&session, &[]).await;
    assert!(report.all_passed(), "failures: {:?}", report.failures());
    assert_eq!(report.totals.total, catalog(&session.config().performance).len());
    assert!(report.used_mock);
    assert!(report.benchmarks.contains_key("response_time_benchmark"));
    assert!(report.benchmarks.contains_key("concurrent_load"));
    let summary = report.latency_summary.as_ref().expect("compliance traces recorded");
    assert_eq!(summary.failed, summary.total - summary.succeeded);
}

#[tokio::test(flavor = "multi_thread")]
async fn compliance_cases_record_one_trace_per_call() {
    let session = compliant_session();
    let report = run_selected(&session, &[Tag::P0]).await;
    assert!(report.all_passed(), "failures: {:?}", report.failures());
    for outcome in &report.outcomes {
        assert!(!outcome.traces().is_empty(), "{} has no traces", outcome.name());
        assert!(outcome.traces().iter().all(|trace| trace.status.is_some()));
    }
    let served = session.mock().expect("mock").requests_served();
    let traced: usize = report.outcomes.iter().map(|outcome| outcome.traces().len()).sum();
    assert_eq!(served, u64::try_from(traced).unwrap());
}

#[test]
fn priority_tags_partition_the_catalog() {
    let performance = mock_config().performance;
    let all: BTreeSet<String> = catalog(&performance).into_iter().map(|case| case.name).collect();
    let mut seen = BTreeSet::new();
    for tag in [Tag::P0, Tag::P1, Tag::P2] {
        for case in select(&performance, &[tag]) {
            assert!(seen.insert(case.name.clone()), "{} selected by two priorities", case.name);
        }
    }
    assert_eq!(seen, all);
}

#[tokio::test(flavor = "multi_thread")]
async fn live_endpoint_passes_p0_when_configured() {
    let Some(config) = live_config() else {
        return;
    };
    let session = session_for(&config);
    let report = run_selected(&session, &[Tag::P0]).await;
    assert!(!report.used_mock);
    assert!(report.all_passed(), "failures: {:?}", report.failures());
}
