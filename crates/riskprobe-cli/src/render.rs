// crates/riskprobe-cli/src/render.rs
// ============================================================================
// Module: Output Rendering
// Description: Plain-text lines for cases, outcomes, and latency statistics.
// Purpose: Keep everything the CLI prints in one testable place.
// Dependencies: riskprobe-core, riskprobe-load, riskprobe-suites
// ============================================================================

//! ## Overview
//! Pure formatting. Nothing here prints; the binary writes the returned
//! lines. Outcome lines carry the diagnostic detail but never request bodies.

use riskprobe_core::Tag;
use riskprobe_core::TestOutcome;
use riskprobe_load::LatencyStats;
use riskprobe_load::SlaViolation;
use riskprobe_suites::RunReport;
use riskprobe_suites::TestCase;

/// Joins tags as a comma-separated label list.
#[must_use]
pub fn tag_list(tags: &[Tag]) -> String {
    tags.iter().map(|tag| tag.as_str()).collect::<Vec<_>>().join(",")
}

/// One `list` line: case name and its tags.
#[must_use]
pub fn case_line(case: &TestCase) -> String {
    format!("{:<36} [{}]", case.name, tag_list(&case.tags))
}

/// One result line per outcome.
#[must_use]
pub fn outcome_line(outcome: &TestOutcome) -> String {
    if outcome.passed() {
        format!("PASS {} ({})", outcome.name(), outcome.priority())
    } else {
        format!("FAIL {} ({}): {}", outcome.name(), outcome.priority(), outcome.detail())
    }
}

/// Closing summary of a run.
#[must_use]
pub fn summary_line(report: &RunReport) -> String {
    let selection = if report.selected_tags.is_empty() {
        "all".to_string()
    } else {
        tag_list(&report.selected_tags)
    };
    format!(
        "{} passed, {} failed, {} total (tags: {selection}, endpoint: {})",
        report.totals.passed, report.totals.failed, report.totals.total, report.endpoint
    )
}

/// Multi-line rendering of benchmark statistics.
#[must_use]
pub fn stats_lines(stats: &LatencyStats) -> Vec<String> {
    let mut lines = vec![
        format!(
            "requests: {} total, {} succeeded, {} failed ({:.1}% success)",
            stats.total,
            stats.succeeded,
            stats.failed,
            stats.success_rate * 100.0
        ),
        format!(
            "latency ms: avg {:.1}, median {:.1}, p95 {:.1}, p99 {:.1}",
            stats.avg_ms, stats.median_ms, stats.p95_ms, stats.p99_ms
        ),
        format!(
            "spread ms: min {:.1}, max {:.1}, stddev {:.1}",
            stats.min_ms, stats.max_ms, stats.stddev_ms
        ),
        format!("throughput: {:.2} req/s over {:.0} ms", stats.throughput_rps, stats.wall_ms),
    ];
    let populated = stats.histogram.buckets.iter().filter(|bucket| bucket.count > 0);
    lines.extend(
        populated.map(|bucket| format!("  <= {:>6} ms: {}", bucket.upper_bound_ms, bucket.count)),
    );
    if stats.histogram.overflow_count > 0 {
        lines.push(format!("  overflow: {}", stats.histogram.overflow_count));
    }
    lines
}

/// One-line SLA verdict.
#[must_use]
pub fn sla_verdict(verdict: &Result<(), SlaViolation>) -> String {
    match verdict {
        Ok(()) => "SLA: met".to_string(),
        Err(violation) => format!("SLA: {violation}"),
    }
}
