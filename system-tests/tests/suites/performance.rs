// system-tests/tests/suites/performance.rs
// ============================================================================
// Module: Performance System Tests
// Description: Load, SLA, and capacity runs against the mock.
// Purpose: Verify the harness measures healthy and degraded APIs correctly.
// Dependencies: riskprobe-load, riskprobe-mock, riskprobe-suites, helpers
// ============================================================================

//! ## Overview
//! Drives the load harness through the same session the CLI uses. Fault
//! injection and fixed delays on the mock produce known breaches.

use std::time::Duration;

use riskprobe_config::SlaThresholds;
use riskprobe_core::Tag;
use riskprobe_load::SlaMetric;
use riskprobe_load::Workload;
use riskprobe_load::assert_sla;
use riskprobe_load::run_benchmark;
use riskprobe_load::run_capacity_sweep;
use riskprobe_mock::MockBehavior;
use riskprobe_suites::run_cases;
use riskprobe_suites::select;

use crate::helpers::harness::compliant_session;
use crate::helpers::harness::mock_session;

#[tokio::test(flavor = "multi_thread")]
async fn load_of_fifty_at_ten_workers_meets_sla() {
    let session = compliant_session();
    let stats = run_benchmark(session.client(), &Workload::varied(50), 50, 10).await.unwrap();
    assert_eq!(stats.total, 50);
    assert!(stats.success_rate >= 0.95);
    assert!(stats.p95_ms < 2000.0);
    assert!(stats.min_ms <= stats.median_ms && stats.median_ms <= stats.p95_ms);
    assert!(stats.p95_ms <= stats.p99_ms && stats.p99_ms <= stats.max_ms);
    assert_eq!(stats.histogram.total(), 50);
    assert_sla(&stats, &session.config().performance.sla).unwrap();
    assert_eq!(session.mock().unwrap().requests_served(), 50);
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_injection_fails_load_case_on_success_rate() {
    let session = mock_session(MockBehavior::default().with_fail_every(4));
    let cases: Vec<_> = select(&session.config().performance, &[Tag::Load])
        .into_iter()
        .filter(|case| case.name == "concurrent_load")
        .collect();
    let report = run_cases(&session, &cases, &[Tag::Load]).await;
    let outcome = report.outcome("concurrent_load").unwrap();
    assert!(!outcome.passed());
    assert!(outcome.detail().contains("success_rate"), "{}", outcome.detail());
    let stats = &report.benchmarks["concurrent_load"];
    assert_eq!(stats.total, 50);
    assert_eq!(stats.failed, 12);
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_api_breaches_latency_thresholds() {
    let session = mock_session(MockBehavior::default().with_delay(Duration::from_millis(150)));
    let stats = run_benchmark(session.client(), &Workload::varied(8), 8, 4).await.unwrap();
    assert!(stats.min_ms >= 150.0);
    let thresholds = SlaThresholds {
        max_avg_ms: 100.0,
        max_p95_ms: 120.0,
        ..SlaThresholds::default()
    };
    let violation = assert_sla(&stats, &thresholds).unwrap_err();
    let metrics: Vec<SlaMetric> = violation.breaches.iter().map(|breach| breach.metric).collect();
    assert!(metrics.contains(&SlaMetric::AvgLatencyMs));
    assert!(metrics.contains(&SlaMetric::P95LatencyMs));
    assert!(!metrics.contains(&SlaMetric::SuccessRate));
}

#[tokio::test(flavor = "multi_thread")]
async fn capacity_sweep_picks_a_healthy_level() {
    let session = compliant_session();
    let levels = [1, 2, 5];
    let report =
        run_capacity_sweep(session.client(), &Workload::varied(10), &levels, 10).await.unwrap();
    assert_eq!(report.levels.len(), 3);
    let optimal = report.optimal_concurrency.unwrap();
    assert!(levels.contains(&optimal));
    assert!(report.levels.iter().all(|level| level.stats.total == 10));
}

#[tokio::test(flavor = "multi_thread")]
async fn every_other_call_failing_leaves_no_healthy_capacity() {
    let session = mock_session(MockBehavior::default().with_fail_every(2));
    let report =
        run_capacity_sweep(session.client(), &Workload::varied(10), &[1, 2], 10).await.unwrap();
    assert_eq!(report.optimal_concurrency, None);
}
