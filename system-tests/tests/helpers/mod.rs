// system-tests/tests/helpers/mod.rs
// ============================================================================
// Module: System Test Helpers
// Description: Shared helpers for riskprobe system-tests.
// Purpose: Provide session builders and report artifact utilities.
// Dependencies: system-tests, riskprobe-suites
// ============================================================================

//! ## Overview
//! Shared helpers for riskprobe system-tests.
//! Invariants:
//! - Every test builds its own session; no mock is shared across tests.
//! - No helper reads or mutates process environment beyond
//!   [`system_tests::config::SystemTestConfig::load`].

#![allow(dead_code, reason = "Shared helpers are reused across multiple test suites.")]

pub mod artifacts;
pub mod harness;
