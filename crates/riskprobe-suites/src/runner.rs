// crates/riskprobe-suites/src/runner.rs
// ============================================================================
// Module: Runner
// Description: Sequential execution of selected test cases.
// Purpose: Turn cases into immutable outcomes and assemble the run report.
// Dependencies: riskprobe-core, riskprobe-load, tracing
// ============================================================================

//! ## Overview
//! Cases run one at a time in catalog order. Each case gets a fresh
//! [`CaseRecorder`]; nothing observed by one case is visible to the next.
//! A failing case never stops the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Instant;

use riskprobe_core::CallTrace;
use riskprobe_core::Tag;
use riskprobe_core::TestOutcome;
use riskprobe_load::LatencySample;
use riskprobe_load::LatencyStats;

use crate::cases::CaseContext;
use crate::cases::CaseRecorder;
use crate::cases::execute;
use crate::catalog::TestCase;
use crate::catalog::select;
use crate::report::RunReport;
use crate::report::timestamp_now;
use crate::report::totals;
use crate::session::HarnessSession;

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs one case and records its outcome.
pub async fn run_case(context: &CaseContext<'_>, case: &TestCase) -> (TestOutcome, CaseRecorder) {
    let mut recorder = CaseRecorder::default();
    let started = Instant::now();
    let result = execute(context, case, &mut recorder).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let traces = recorder.traces.clone();
    let outcome = match result {
        Ok(detail) => {
            tracing::info!(case = %case.name, priority = %case.priority, elapsed_ms, "PASS");
            TestOutcome::pass(&case.name, case.priority, case.tags.clone(), detail, traces)
        }
        Err(failure) => {
            let detail = failure.to_string();
            tracing::warn!(case = %case.name, priority = %case.priority, %detail, "FAIL");
            TestOutcome::fail(&case.name, case.priority, case.tags.clone(), detail, traces)
        }
    };
    (outcome, recorder)
}

/// Runs `cases` sequentially and assembles the report.
pub async fn run_cases(
    session: &HarnessSession,
    cases: &[TestCase],
    selected_tags: &[Tag],
) -> RunReport {
    let context = CaseContext::new(session.client(), session.config());
    let started_at = timestamp_now();
    let started = Instant::now();
    let mut outcomes = Vec::with_capacity(cases.len());
    let mut benchmarks = BTreeMap::new();
    for case in cases {
        let (outcome, recorder) = run_case(&context, case).await;
        benchmarks.extend(recorder.benchmarks);
        outcomes.push(outcome);
    }
    let latency_summary = summarize_traces(
        outcomes.iter().flat_map(TestOutcome::traces),
        started.elapsed(),
    );
    let totals = totals(&outcomes);
    tracing::info!(total = totals.total, passed = totals.passed, failed = totals.failed, "run complete");
    RunReport {
        started_at,
        finished_at: timestamp_now(),
        endpoint: session.client().endpoint().to_string(),
        used_mock: session.mock().is_some(),
        selected_tags: selected_tags.to_vec(),
        totals,
        outcomes,
        benchmarks,
        latency_summary,
    }
}

/// Selects cases by tag from the session's configuration and runs them.
pub async fn run_selected(session: &HarnessSession, selected_tags: &[Tag]) -> RunReport {
    let cases = select(&session.config().performance, selected_tags);
    tracing::info!(cases = cases.len(), "running selected cases");
    run_cases(session, &cases, selected_tags).await
}

/// Reduces recorded exchange latencies to summary statistics.
fn summarize_traces<'a>(
    traces: impl Iterator<Item = &'a CallTrace>,
    wall: std::time::Duration,
) -> Option<LatencyStats> {
    let samples: Vec<LatencySample> = traces
        .map(|trace| match trace.status {
            Some(status) => LatencySample::completed(trace.elapsed_ms, status),
            None => LatencySample::failed(trace.elapsed_ms),
        })
        .collect();
    LatencyStats::from_samples(&samples, wall).ok()
}
