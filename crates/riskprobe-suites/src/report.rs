// crates/riskprobe-suites/src/report.rs
// ============================================================================
// Module: Run Report
// Description: Structured record of one harness run.
// Purpose: Hand outcomes and latency statistics to downstream renderers.
// Dependencies: riskprobe-core, riskprobe-load, serde, serde_jcs, time
// ============================================================================

//! ## Overview
//! [`RunReport`] is the report-aggregator input: the ordered
//! [`TestOutcome`] sequence, named benchmark statistics, and a latency
//! summary over every recorded compliance exchange. It is written as
//! canonical JSON (`report.json`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use riskprobe_core::Tag;
use riskprobe_core::TestOutcome;
use riskprobe_load::LatencyStats;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the run report inside the report directory.
pub const REPORT_FILE_NAME: &str = "report.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Report write failures.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization failed.
    #[error("report serialization failed: {0}")]
    Serialize(String),
    /// Filesystem write failed.
    #[error("report write failed for {path}: {message}")]
    Io {
        /// Target path.
        path: String,
        /// Underlying error.
        message: String,
    },
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Counts of passing and failing outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunTotals {
    /// Cases run.
    pub total: usize,
    /// Cases that passed.
    pub passed: usize,
    /// Cases that failed.
    pub failed: usize,
}

/// Structured record of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run start (RFC 3339, UTC).
    pub started_at: String,
    /// Run end (RFC 3339, UTC).
    pub finished_at: String,
    /// Inference endpoint exercised.
    pub endpoint: String,
    /// Whether the in-process mock served the run.
    pub used_mock: bool,
    /// Tags selected (empty selects everything).
    pub selected_tags: Vec<Tag>,
    /// Outcome counts.
    pub totals: RunTotals,
    /// Outcomes in run order.
    pub outcomes: Vec<TestOutcome>,
    /// Named benchmark statistics.
    pub benchmarks: BTreeMap<String, LatencyStats>,
    /// Latency summary over compliance exchanges, when any were recorded.
    pub latency_summary: Option<LatencyStats>,
}

impl RunReport {
    /// Returns true when every selected case passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(TestOutcome::passed)
    }

    /// Returns the failing outcomes.
    #[must_use]
    pub fn failures(&self) -> Vec<&TestOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.passed()).collect()
    }

    /// Finds an outcome by name.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|outcome| outcome.name() == name)
    }
}

/// Computes outcome totals.
#[must_use]
pub fn totals(outcomes: &[TestOutcome]) -> RunTotals {
    let passed = outcomes.iter().filter(|outcome| outcome.passed()).count();
    RunTotals {
        total: outcomes.len(),
        passed,
        failed: outcomes.len() - passed,
    }
}

/// Formats the current UTC time as RFC 3339.
#[must_use]
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

/// Writes `report` as canonical JSON into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`ReportError`] when serialization or the write fails.
pub fn write_report(report: &RunReport, dir: &Path) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|err| ReportError::Io {
        path: dir.display().to_string(),
        message: err.to_string(),
    })?;
    let path = dir.join(REPORT_FILE_NAME);
    let mut bytes =
        serde_jcs::to_vec(report).map_err(|err| ReportError::Serialize(err.to_string()))?;
    bytes.push(b'\n');
    fs::write(&path, bytes).map_err(|err| ReportError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(path)
}
