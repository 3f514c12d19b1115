// crates/riskprobe-cli/src/lib.rs
// ============================================================================
// Module: riskprobe CLI Library
// Description: Shared helpers for the riskprobe command-line interface.
// Purpose: Keep bind checks and output rendering testable outside the binary.
// Dependencies: riskprobe-config, riskprobe-core, riskprobe-load, riskprobe-suites
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) parses arguments and dispatches;
//! everything it prints is rendered here, and the standalone mock's bind
//! address is checked here before any socket is opened.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Network exposure checks for `riskprobe mock`.
pub mod bind_policy;
/// Plain-text rendering of cases, outcomes, and statistics.
pub mod render;
