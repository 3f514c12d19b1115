// crates/riskprobe-load/src/stats.rs
// ============================================================================
// Module: Latency Statistics
// Description: Per-call samples and their derived aggregate statistics.
// Purpose: Turn raw benchmark timings into percentile and throughput figures.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`LatencyStats::from_samples`] sorts the sample latencies once and derives
//! every figure from that sorted copy; the input samples are never mutated.
//! Percentiles use linear interpolation between closest ranks
//! (`rank = p / 100 * (n - 1)`). Standard deviation is the sample (n - 1)
//! deviation. Failed calls are timed and included in every latency figure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Histogram bucket upper bounds in milliseconds.
pub const LATENCY_BUCKETS_MS: [u32; 14] =
    [1, 2, 5, 10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000];

/// Smallest wall-clock duration used as a throughput divisor.
const MIN_WALL_SECONDS: f64 = 0.000_001;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Statistics failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// No samples were collected.
    #[error("no latency samples to aggregate")]
    NoSamples,
}

// ============================================================================
// SECTION: Samples
// ============================================================================

/// Timing of one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    /// Wall-clock latency in milliseconds.
    pub elapsed_ms: f64,
    /// HTTP status; absent when the call failed before a response.
    pub status: Option<u16>,
    /// True for 2xx responses.
    pub succeeded: bool,
}

impl LatencySample {
    /// Records a call that produced an HTTP status.
    #[must_use]
    pub const fn completed(elapsed_ms: f64, status: u16) -> Self {
        Self {
            elapsed_ms,
            status: Some(status),
            succeeded: status >= 200 && status < 300,
        }
    }

    /// Records a call that failed without a status (timeout, connection error).
    #[must_use]
    pub const fn failed(elapsed_ms: f64) -> Self {
        Self {
            elapsed_ms,
            status: None,
            succeeded: false,
        }
    }
}

// ============================================================================
// SECTION: Histogram
// ============================================================================

/// Count of samples at or below one bucket bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBucket {
    /// Inclusive upper bound in milliseconds.
    pub upper_bound_ms: u32,
    /// Samples in this bucket.
    pub count: usize,
}

/// Latency distribution over [`LATENCY_BUCKETS_MS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyHistogram {
    /// Buckets in ascending bound order.
    pub buckets: Vec<HistogramBucket>,
    /// Samples above the largest bound.
    pub overflow_count: usize,
}

impl LatencyHistogram {
    /// Buckets the given latencies.
    #[must_use]
    pub fn from_latencies(latencies: &[f64]) -> Self {
        let mut counts = [0_usize; LATENCY_BUCKETS_MS.len()];
        let mut overflow_count = 0_usize;
        for latency in latencies {
            match LATENCY_BUCKETS_MS.iter().position(|bound| *latency <= f64::from(*bound)) {
                Some(index) => counts[index] = counts[index].saturating_add(1),
                None => overflow_count = overflow_count.saturating_add(1),
            }
        }
        let buckets = LATENCY_BUCKETS_MS
            .iter()
            .zip(counts)
            .map(|(upper_bound_ms, count)| HistogramBucket {
                upper_bound_ms: *upper_bound_ms,
                count,
            })
            .collect();
        Self {
            buckets,
            overflow_count,
        }
    }

    /// Returns the total number of bucketed samples.
    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.count).sum::<usize>() + self.overflow_count
    }
}

// ============================================================================
// SECTION: Aggregate Statistics
// ============================================================================

/// Derived statistics for one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Calls issued.
    pub total: usize,
    /// Calls answered with 2xx.
    pub succeeded: usize,
    /// Calls that failed (non-2xx, timeout, connection error).
    pub failed: usize,
    /// `succeeded / total`.
    pub success_rate: f64,
    /// Mean latency in milliseconds.
    pub avg_ms: f64,
    /// Median latency in milliseconds.
    pub median_ms: f64,
    /// 95th-percentile latency in milliseconds.
    pub p95_ms: f64,
    /// 99th-percentile latency in milliseconds.
    pub p99_ms: f64,
    /// Sample standard deviation in milliseconds.
    pub stddev_ms: f64,
    /// Fastest call in milliseconds.
    pub min_ms: f64,
    /// Slowest call in milliseconds.
    pub max_ms: f64,
    /// `total / wall-clock seconds`.
    pub throughput_rps: f64,
    /// Wall-clock duration of the run in milliseconds.
    pub wall_ms: f64,
    /// Latency distribution.
    pub histogram: LatencyHistogram,
}

impl LatencyStats {
    /// Aggregates samples collected over `wall` wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::NoSamples`] when `samples` is empty.
    pub fn from_samples(samples: &[LatencySample], wall: Duration) -> Result<Self, StatsError> {
        let mut sorted: Vec<f64> = samples.iter().map(|sample| sample.elapsed_ms).collect();
        sorted.sort_by(f64::total_cmp);
        let (Some(min_ms), Some(max_ms)) = (sorted.first().copied(), sorted.last().copied()) else {
            return Err(StatsError::NoSamples);
        };
        let total = sorted.len();
        let succeeded = samples.iter().filter(|sample| sample.succeeded).count();
        let avg_ms = mean(&sorted);
        let wall_seconds = wall.as_secs_f64();
        Ok(Self {
            total,
            succeeded,
            failed: total - succeeded,
            success_rate: count_f64(succeeded) / count_f64(total),
            avg_ms,
            median_ms: percentile(&sorted, 50).unwrap_or(avg_ms),
            p95_ms: percentile(&sorted, 95).unwrap_or(max_ms),
            p99_ms: percentile(&sorted, 99).unwrap_or(max_ms),
            stddev_ms: sample_stddev(&sorted, avg_ms),
            min_ms,
            max_ms,
            throughput_rps: count_f64(total) / wall_seconds.max(MIN_WALL_SECONDS),
            wall_ms: wall_seconds * 1000.0,
            histogram: LatencyHistogram::from_latencies(&sorted),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Linear-interpolation percentile over ascending `sorted` values.
///
/// Returns `None` for an empty slice or a percent above 100.
#[must_use]
pub fn percentile(sorted: &[f64], percent: u32) -> Option<f64> {
    if sorted.is_empty() || percent > 100 {
        return None;
    }
    let span = sorted.len() - 1;
    let scaled = span.checked_mul(usize::try_from(percent).ok()?)?;
    let lower = scaled / 100;
    let remainder = u32::try_from(scaled % 100).ok()?;
    let low = *sorted.get(lower)?;
    let Some(high) = sorted.get(lower + 1).copied() else {
        return Some(low);
    };
    Some(f64::from(remainder).mul_add((high - low) / 100.0, low))
}

/// Arithmetic mean of a non-empty slice.
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / count_f64(values.len())
}

/// Sample standard deviation; zero below two samples.
fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let squares: f64 = values.iter().map(|value| (value - mean).powi(2)).sum();
    (squares / count_f64(values.len() - 1)).sqrt()
}

/// Converts a sample count to `f64` without a lossy cast.
pub(crate) fn count_f64(count: usize) -> f64 {
    u32::try_from(count).map_or(f64::from(u32::MAX), f64::from)
}
