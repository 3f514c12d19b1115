// system-tests/src/lib.rs
// ============================================================================
// Module: riskprobe System Tests Library
// Description: Shared configuration for system test scenarios.
// Purpose: Provide typed environment settings to the system-test binaries.
// Dependencies: riskprobe-config
// ============================================================================

//! ## Overview
//! This crate hosts configuration shared by the riskprobe system-test
//! binaries in `system-tests/tests`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
