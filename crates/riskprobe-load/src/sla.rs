// crates/riskprobe-load/src/sla.rs
// ============================================================================
// Module: SLA Evaluation
// Description: Threshold checks over aggregate latency statistics.
// Purpose: Name every breached metric with its observed and allowed values.
// Dependencies: riskprobe-config, serde, thiserror
// ============================================================================

//! ## Overview
//! [`assert_sla`] compares one [`LatencyStats`] against [`SlaThresholds`] and
//! collects every breach rather than stopping at the first.
//! [`assert_no_degradation`] compares sustained-load windows against the
//! first window's p95.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use riskprobe_config::SlaThresholds;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::stats::LatencyStats;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Metric compared against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaMetric {
    /// Mean latency must stay below the maximum.
    AvgLatencyMs,
    /// p95 latency must stay below the maximum.
    P95LatencyMs,
    /// Success rate must reach the minimum.
    SuccessRate,
    /// Throughput must reach the minimum.
    ThroughputRps,
    /// A later sustained-load window's p95 must stay within the allowed growth.
    WindowP95Ms,
}

impl SlaMetric {
    /// Returns the metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AvgLatencyMs => "avg_latency_ms",
            Self::P95LatencyMs => "p95_latency_ms",
            Self::SuccessRate => "success_rate",
            Self::ThroughputRps => "throughput_rps",
            Self::WindowP95Ms => "window_p95_ms",
        }
    }
}

/// One threshold breach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaBreach {
    /// Breached metric.
    pub metric: SlaMetric,
    /// Observed value.
    pub observed: f64,
    /// Threshold the value was compared with.
    pub threshold: f64,
    /// Sustained-load window index, when the breach is window-specific.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
}

impl fmt::Display for SlaBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = match self.metric {
            SlaMetric::SuccessRate | SlaMetric::ThroughputRps => "below minimum",
            SlaMetric::AvgLatencyMs | SlaMetric::P95LatencyMs | SlaMetric::WindowP95Ms => {
                "exceeds maximum"
            }
        };
        write!(f, "{} {:.3} {relation} {:.3}", self.metric.as_str(), self.observed, self.threshold)?;
        if let Some(window) = self.window {
            write!(f, " (window {window})")?;
        }
        Ok(())
    }
}

/// Aggregate performance metrics breached their thresholds.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("SLA violation: {}", render_breaches(&self.breaches))]
pub struct SlaViolation {
    /// Every breach found.
    pub breaches: Vec<SlaBreach>,
}

/// Joins breach descriptions for display.
fn render_breaches(breaches: &[SlaBreach]) -> String {
    breaches.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Checks `stats` against every threshold.
///
/// # Errors
///
/// Returns [`SlaViolation`] listing each breached metric.
pub fn assert_sla(stats: &LatencyStats, thresholds: &SlaThresholds) -> Result<(), SlaViolation> {
    let mut breaches = Vec::new();
    let mut breach = |metric, observed, threshold| {
        breaches.push(SlaBreach {
            metric,
            observed,
            threshold,
            window: None,
        });
    };
    if stats.avg_ms >= thresholds.max_avg_ms {
        breach(SlaMetric::AvgLatencyMs, stats.avg_ms, thresholds.max_avg_ms);
    }
    if stats.p95_ms >= thresholds.max_p95_ms {
        breach(SlaMetric::P95LatencyMs, stats.p95_ms, thresholds.max_p95_ms);
    }
    if stats.success_rate < thresholds.min_success_rate {
        breach(SlaMetric::SuccessRate, stats.success_rate, thresholds.min_success_rate);
    }
    if stats.throughput_rps < thresholds.min_throughput_rps {
        breach(SlaMetric::ThroughputRps, stats.throughput_rps, thresholds.min_throughput_rps);
    }
    if breaches.is_empty() { Ok(()) } else { Err(SlaViolation { breaches }) }
}

/// Checks that no later window's p95 exceeds the first window's p95 by more
/// than `ratio`.
///
/// Growth under `slack_ms` is ignored so millisecond-scale jitter against a
/// fast baseline does not register as degradation.
///
/// # Errors
///
/// Returns [`SlaViolation`] with one [`SlaMetric::WindowP95Ms`] breach per
/// degraded window.
pub fn assert_no_degradation(
    windows: &[LatencyStats],
    ratio: f64,
    slack_ms: f64,
) -> Result<(), SlaViolation> {
    let Some((baseline, later)) = windows.split_first() else {
        return Ok(());
    };
    let allowed = baseline.p95_ms * ratio;
    let breaches: Vec<SlaBreach> = later
        .iter()
        .enumerate()
        .filter(|(_, window)| window.p95_ms > allowed && window.p95_ms - baseline.p95_ms > slack_ms)
        .map(|(index, window)| SlaBreach {
            metric: SlaMetric::WindowP95Ms,
            observed: window.p95_ms,
            threshold: allowed,
            window: Some(index + 1),
        })
        .collect();
    if breaches.is_empty() { Ok(()) } else { Err(SlaViolation { breaches }) }
}
