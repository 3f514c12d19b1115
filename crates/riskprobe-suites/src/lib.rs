// crates/riskprobe-suites/src/lib.rs
// ============================================================================
// Module: riskprobe Suites Library
// Description: Compliance, variation, and performance test suites.
// Purpose: Compose generators, assertions, and the load harness into runs.
// Dependencies: riskprobe-client, riskprobe-core, riskprobe-load, riskprobe-mock
// ============================================================================

//! ## Overview
//! `riskprobe-suites` turns the scenario catalog into tagged [`TestCase`]s,
//! runs them sequentially against a [`HarnessSession`], and records each as
//! an immutable [`riskprobe_core::TestOutcome`] inside a [`RunReport`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cases;
pub mod catalog;
pub mod report;
pub mod runner;
pub mod session;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cases::CaseFailure;
pub use catalog::CaseKind;
pub use catalog::TestCase;
pub use catalog::catalog;
pub use catalog::select;
pub use report::RunReport;
pub use report::write_report;
pub use runner::run_cases;
pub use runner::run_selected;
pub use session::HarnessSession;
pub use session::SessionError;
