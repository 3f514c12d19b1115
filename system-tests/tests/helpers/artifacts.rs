// system-tests/tests/helpers/artifacts.rs
// ============================================================================
// Module: Report Artifacts
// Description: Writes and reloads run reports for inspection.
// Purpose: Keep report files in a temp dir unless a report dir is configured.
// Dependencies: riskprobe-suites, serde_json, tempfile
// ============================================================================

use std::fs;
use std::path::PathBuf;

use riskprobe_suites::RunReport;
use riskprobe_suites::write_report;
use serde_json::Value;
use tempfile::TempDir;

use super::harness::system_config;

/// A written report and the directory keeping it alive.
pub struct WrittenReport {
    /// Report file path.
    pub path: PathBuf,
    /// Raw bytes as written.
    pub bytes: Vec<u8>,
    /// Temporary directory, absent when a persistent dir is configured.
    _temp: Option<TempDir>,
}

impl WrittenReport {
    /// Parses the written bytes as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or_else(|err| panic!("report json: {err}"))
    }
}

/// Writes `report` under `label` and reads it back.
pub fn write_and_read(report: &RunReport, label: &str) -> WrittenReport {
    let (dir, temp) = match system_config().report_dir {
        Some(root) => (root.join(label), None),
        None => {
            let temp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
            (temp.path().join(label), Some(temp))
        }
    };
    let path = write_report(report, &dir).unwrap_or_else(|err| panic!("write report: {err}"));
    let bytes = fs::read(&path).unwrap_or_else(|err| panic!("read report: {err}"));
    WrittenReport {
        path,
        bytes,
        _temp: temp,
    }
}
