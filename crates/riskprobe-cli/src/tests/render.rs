// crates/riskprobe-cli/src/tests/render.rs
// ============================================================================
// Module: Output Rendering Tests
// Description: Unit tests for CLI output lines.
// Purpose: Keep printed verdicts and statistics readable and complete.
// Dependencies: riskprobe-cli render, riskprobe-load, riskprobe-suites
// ============================================================================

//! ## Overview
//! Checks the text produced for cases, outcomes, run summaries, and
//! benchmark statistics.

use std::collections::BTreeMap;
use std::time::Duration;

use riskprobe_config::PerformanceConfig;
use riskprobe_config::SlaThresholds;
use riskprobe_core::Priority;
use riskprobe_core::Tag;
use riskprobe_core::TestOutcome;
use riskprobe_load::LatencySample;
use riskprobe_load::LatencyStats;
use riskprobe_load::assert_sla;
use riskprobe_suites::RunReport;
use riskprobe_suites::report::totals;
use riskprobe_suites::select;

use crate::render;

fn sample_stats() -> LatencyStats {
    let samples = vec![
        LatencySample::completed(10.0, 200),
        LatencySample::completed(20.0, 200),
        LatencySample::completed(30.0, 200),
        LatencySample::failed(40.0),
    ];
    LatencyStats::from_samples(&samples, Duration::from_secs(1)).expect("stats")
}

fn report_with(outcomes: Vec<TestOutcome>, selected_tags: Vec<Tag>) -> RunReport {
    RunReport {
        started_at: "2026-01-01T00:00:00Z".to_string(),
        finished_at: "2026-01-01T00:00:01Z".to_string(),
        endpoint: "http://127.0.0.1:8000/v1/model/infer".to_string(),
        used_mock: true,
        selected_tags,
        totals: totals(&outcomes),
        outcomes,
        benchmarks: BTreeMap::new(),
        latency_summary: None,
    }
}

#[test]
fn case_line_lists_tags() {
    let cases = select(&PerformanceConfig::default(), &[Tag::Load]);
    let line = render::case_line(&cases[0]);
    assert!(line.starts_with("concurrent_load"));
    assert!(line.ends_with("[p1,performance,load]"));
}

#[test]
fn outcome_lines_mark_pass_and_fail() {
    let pass = TestOutcome::pass("schema_valid", Priority::P0, vec![Tag::P0], "", Vec::new());
    let fail = TestOutcome::fail(
        "phi_not_echoed",
        Priority::P0,
        vec![Tag::P0],
        "PHI leak: phone number",
        Vec::new(),
    );
    assert_eq!(render::outcome_line(&pass), "PASS schema_valid (p0)");
    assert_eq!(render::outcome_line(&fail), "FAIL phi_not_echoed (p0): PHI leak: phone number");
}

#[test]
fn summary_line_counts_outcomes() {
    let outcomes = vec![
        TestOutcome::pass("a", Priority::P0, vec![Tag::P0], "", Vec::new()),
        TestOutcome::fail("b", Priority::P1, vec![Tag::P1], "bad", Vec::new()),
    ];
    let all = render::summary_line(&report_with(outcomes.clone(), Vec::new()));
    assert!(all.starts_with("1 passed, 1 failed, 2 total (tags: all"));
    let tagged = render::summary_line(&report_with(outcomes, vec![Tag::P0, Tag::P1]));
    assert!(tagged.contains("tags: p0,p1"));
}

#[test]
fn stats_lines_cover_percentiles_and_histogram() {
    let lines = render::stats_lines(&sample_stats());
    assert!(lines[0].contains("4 total, 3 succeeded, 1 failed (75.0% success)"));
    assert!(lines[1].contains("p95"));
    assert!(lines[2].contains("min 10.0, max 40.0"));
    assert!(lines[3].starts_with("throughput: 4.00 req/s"));
    assert!(lines.iter().any(|line| line.contains("<=     10 ms: 1")));
    assert!(lines.iter().any(|line| line.contains("<=     25 ms: 1")));
    assert!(lines.iter().any(|line| line.contains("<=     50 ms: 2")));
}

#[test]
fn sla_verdict_names_breaches() {
    let stats = sample_stats();
    let met = assert_sla(&stats, &SlaThresholds {
        min_success_rate: 0.5,
        min_throughput_rps: 1.0,
        ..SlaThresholds::default()
    });
    assert_eq!(render::sla_verdict(&met), "SLA: met");
    let breached = assert_sla(&stats, &SlaThresholds::default());
    let verdict = render::sla_verdict(&breached);
    assert!(verdict.contains("success_rate"));
}
