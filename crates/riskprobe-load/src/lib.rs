// crates/riskprobe-load/src/lib.rs
// ============================================================================
// Module: riskprobe Load Library
// Description: Performance and load harness for the inference endpoint.
// Purpose: Quantify latency and throughput and judge them against SLAs.
// Dependencies: riskprobe-client, riskprobe-config, serde, tokio, tracing
// ============================================================================

//! ## Overview
//! `riskprobe-load` issues single or concurrent request batches through a
//! bounded worker pool, reduces per-call timings to [`LatencyStats`], and
//! compares them with configured [`riskprobe_config::SlaThresholds`].
//! Failed calls count against the success rate; only an aggregate SLA breach
//! is an error.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod harness;
pub mod sla;
pub mod stats;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use harness::CapacityLevel;
pub use harness::CapacityReport;
pub use harness::LoadError;
pub use harness::SustainedReport;
pub use harness::Workload;
pub use harness::run_benchmark;
pub use harness::run_capacity_sweep;
pub use harness::run_sustained;
pub use sla::SlaBreach;
pub use sla::SlaMetric;
pub use sla::SlaViolation;
pub use sla::assert_no_degradation;
pub use sla::assert_sla;
pub use stats::LatencyHistogram;
pub use stats::LatencySample;
pub use stats::LatencyStats;
pub use stats::StatsError;
