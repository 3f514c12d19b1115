// crates/riskprobe-load/src/harness.rs
// ============================================================================
// Module: Load Harness
// Description: Bounded worker pool issuing timed inference calls.
// Purpose: Drive benchmarks, sustained windows, and capacity sweeps.
// Dependencies: riskprobe-client, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! Every run splits `n_requests` across exactly `concurrency` workers spawned
//! on a [`JoinSet`]; each worker issues its share sequentially. A timeout or
//! connection error becomes a failed [`LatencySample`] and never aborts the
//! run. Samples live only for the duration of one run and are reduced to
//! [`LatencyStats`] before returning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use riskprobe_client::ModelClient;
use riskprobe_core::InferenceRequest;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::stats::LatencySample;
use crate::stats::LatencyStats;
use crate::stats::StatsError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Success rate a capacity level needs to be considered for the optimum.
pub const MIN_CAPACITY_SUCCESS_RATE: f64 = 0.95;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Load harness failures. Failed calls are samples, not errors.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The run parameters cannot produce a run.
    #[error("invalid load plan: {0}")]
    InvalidPlan(String),
    /// A worker task panicked or was cancelled.
    #[error("load worker failed: {0}")]
    Worker(String),
    /// Statistics could not be derived.
    #[error(transparent)]
    Stats(#[from] StatsError),
}

// ============================================================================
// SECTION: Workloads
// ============================================================================

/// Request bodies issued by a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Workload {
    /// The same body for every call.
    Single(Value),
    /// Bodies cycled by global call index.
    Varied(Vec<Value>),
}

impl Workload {
    /// Builds a single-body workload from a typed request.
    #[must_use]
    pub fn single(request: &InferenceRequest) -> Self {
        Self::Single(serde_json::to_value(request).unwrap_or(Value::Null))
    }

    /// Builds `count` distinct exertional-chest-pain requests.
    ///
    /// Patient ids, ages, and sex vary per request so caching on the server
    /// side cannot flatter the numbers.
    #[must_use]
    pub fn varied(count: usize) -> Self {
        let bodies = (0 .. count.max(1))
            .map(|index| {
                let age = 50 + i64::try_from(index % 30).unwrap_or(0);
                let request = InferenceRequest::new(format!("load-test-{index}"))
                    .with_age(age)
                    .with_sex(if index % 2 == 0 { "male" } else { "female" })
                    .with_complaint("Chest pain on exertion");
                serde_json::to_value(&request).unwrap_or(Value::Null)
            })
            .collect();
        Self::Varied(bodies)
    }

    /// Returns the body for global call `index`.
    fn body(&self, index: usize) -> Option<&Value> {
        match self {
            Self::Single(body) => Some(body),
            Self::Varied(bodies) => bodies.get(index % bodies.len().max(1)),
        }
    }

    /// Returns true when the workload has no body to send.
    fn is_empty(&self) -> bool {
        matches!(self, Self::Varied(bodies) if bodies.is_empty())
    }
}

// ============================================================================
// SECTION: Benchmarks
// ============================================================================

/// Issues `n_requests` calls across `concurrency` workers and aggregates them.
///
/// # Errors
///
/// Returns [`LoadError::InvalidPlan`] for zero requests, zero concurrency, or
/// an empty workload, and [`LoadError::Worker`] when a worker task dies.
pub async fn run_benchmark(
    client: &ModelClient,
    workload: &Workload,
    n_requests: usize,
    concurrency: usize,
) -> Result<LatencyStats, LoadError> {
    if n_requests == 0 {
        return Err(LoadError::InvalidPlan("n_requests must be > 0".to_string()));
    }
    if workload.is_empty() {
        return Err(LoadError::InvalidPlan("workload has no request bodies".to_string()));
    }
    let distribution = distribute_iterations(n_requests, concurrency)?;
    let workload = Arc::new(workload.clone());
    let started = Instant::now();
    let mut joins = JoinSet::new();
    for (worker_idx, iterations) in distribution.into_iter().enumerate() {
        let client = client.clone();
        let workload = Arc::clone(&workload);
        joins.spawn(async move {
            run_worker(&client, &workload, worker_idx, concurrency, iterations).await
        });
    }
    let samples = gather_worker_samples(&mut joins).await?;
    let stats = LatencyStats::from_samples(&samples, started.elapsed())?;
    tracing::info!(
        total = stats.total,
        concurrency,
        success_rate = stats.success_rate,
        p95_ms = stats.p95_ms,
        throughput_rps = stats.throughput_rps,
        "benchmark complete"
    );
    Ok(stats)
}

/// Issues one worker's share of calls sequentially.
async fn run_worker(
    client: &ModelClient,
    workload: &Workload,
    worker_idx: usize,
    workers: usize,
    iterations: usize,
) -> Vec<LatencySample> {
    let mut samples = Vec::with_capacity(iterations);
    for iteration in 0 .. iterations {
        let index = worker_idx + iteration * workers;
        let Some(body) = workload.body(index) else {
            continue;
        };
        let started = Instant::now();
        let sample = match client.call_model(body).await {
            Ok(call) => LatencySample::completed(call.elapsed_ms(), call.status),
            Err(err) => {
                tracing::debug!(worker = worker_idx, error = %err, "load call failed");
                LatencySample::failed(started.elapsed().as_secs_f64() * 1000.0)
            }
        };
        samples.push(sample);
    }
    tracing::debug!(worker = worker_idx, calls = samples.len(), "load worker finished");
    samples
}

/// Merges worker samples; a worker that panicked fails the run.
async fn gather_worker_samples(
    joins: &mut JoinSet<Vec<LatencySample>>,
) -> Result<Vec<LatencySample>, LoadError> {
    let mut merged = Vec::new();
    while let Some(result) = joins.join_next().await {
        let worker_samples = result.map_err(|err| LoadError::Worker(err.to_string()))?;
        merged.extend(worker_samples);
    }
    Ok(merged)
}

/// Splits `total` iterations across `workers` as evenly as possible.
///
/// # Errors
///
/// Returns [`LoadError::InvalidPlan`] when `workers` is zero.
pub fn distribute_iterations(total: usize, workers: usize) -> Result<Vec<usize>, LoadError> {
    if workers == 0 {
        return Err(LoadError::InvalidPlan("concurrency must be > 0".to_string()));
    }
    let base = total / workers;
    let remainder = total % workers;
    let mut distribution = vec![base; workers];
    for slot in distribution.iter_mut().take(remainder) {
        *slot = slot.saturating_add(1);
    }
    Ok(distribution)
}

// ============================================================================
// SECTION: Sustained Load
// ============================================================================

/// Consecutive benchmark windows of equal size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainedReport {
    /// Statistics per window, in run order.
    pub windows: Vec<LatencyStats>,
}

/// Runs `windows` back-to-back benchmarks of `requests_per_window` calls.
///
/// # Errors
///
/// Returns [`LoadError`] when any window cannot run.
pub async fn run_sustained(
    client: &ModelClient,
    workload: &Workload,
    windows: usize,
    requests_per_window: usize,
    concurrency: usize,
) -> Result<SustainedReport, LoadError> {
    if windows == 0 {
        return Err(LoadError::InvalidPlan("sustained windows must be > 0".to_string()));
    }
    let mut report = SustainedReport {
        windows: Vec::with_capacity(windows),
    };
    for window in 0 .. windows {
        let stats = run_benchmark(client, workload, requests_per_window, concurrency).await?;
        tracing::debug!(window, p95_ms = stats.p95_ms, "sustained window complete");
        report.windows.push(stats);
    }
    Ok(report)
}

// ============================================================================
// SECTION: Capacity Sweep
// ============================================================================

/// Statistics at one concurrency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityLevel {
    /// Worker count.
    pub concurrency: usize,
    /// Run statistics.
    pub stats: LatencyStats,
}

/// Result of a capacity sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityReport {
    /// Levels in sweep order.
    pub levels: Vec<CapacityLevel>,
    /// Highest-throughput level meeting [`MIN_CAPACITY_SUCCESS_RATE`].
    pub optimal_concurrency: Option<usize>,
}

impl CapacityReport {
    /// Builds a report and selects the optimal level.
    ///
    /// Ties go to the lower concurrency.
    #[must_use]
    pub fn from_levels(levels: Vec<CapacityLevel>) -> Self {
        let mut best: Option<&CapacityLevel> = None;
        let healthy =
            levels.iter().filter(|level| level.stats.success_rate >= MIN_CAPACITY_SUCCESS_RATE);
        for level in healthy {
            if best.is_none_or(|current| level.stats.throughput_rps > current.stats.throughput_rps) {
                best = Some(level);
            }
        }
        let optimal_concurrency = best.map(|level| level.concurrency);
        Self {
            levels,
            optimal_concurrency,
        }
    }
}

/// Runs `requests_per_level` calls at each concurrency level.
///
/// # Errors
///
/// Returns [`LoadError`] when no levels are given or a level cannot run.
pub async fn run_capacity_sweep(
    client: &ModelClient,
    workload: &Workload,
    levels: &[usize],
    requests_per_level: usize,
) -> Result<CapacityReport, LoadError> {
    if levels.is_empty() {
        return Err(LoadError::InvalidPlan("capacity sweep needs at least one level".to_string()));
    }
    let mut results = Vec::with_capacity(levels.len());
    for &concurrency in levels {
        let stats = run_benchmark(client, workload, requests_per_level, concurrency).await?;
        results.push(CapacityLevel {
            concurrency,
            stats,
        });
    }
    let report = CapacityReport::from_levels(results);
    tracing::info!(
        levels = report.levels.len(),
        optimal = report.optimal_concurrency.unwrap_or(0),
        "capacity sweep complete"
    );
    Ok(report)
}
