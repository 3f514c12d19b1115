// system-tests/tests/reliability.rs
// ============================================================================
// Module: Reliability Suite
// Description: Aggregates transport, ordering, and report system tests.
// Purpose: Reduce binaries while keeping reliability coverage centralized.
// Dependencies: suites/*, helpers
// ============================================================================

//! ## Overview
//! Aggregates transport, ordering, and report system tests.
//! Invariants:
//! - Every test starts its own mock and owns its fixtures.
//! - No retries: a failed call is reported, never repeated.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod helpers;

#[path = "suites/reliability.rs"]
mod reliability;
