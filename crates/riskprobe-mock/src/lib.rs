// crates/riskprobe-mock/src/lib.rs
// ============================================================================
// Module: riskprobe Mock Library
// Description: Deterministic stand-in for the risk-classification API.
// Purpose: Provide a stable oracle for assertions and scenario generators.
// Dependencies: axum, riskprobe-core, serde_json, tokio, tracing
// ============================================================================

//! ## Overview
//! `riskprobe-mock` implements the inference wire contract with fixed,
//! keyword-driven replies. It runs in-process for `USE_MOCK` runs and tests,
//! or standalone through `riskprobe mock`. Fault modes (complaint echo,
//! off-contract labels, delays, injected 503s) let negative tests prove the
//! harness catches each defect class.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod classifier;
pub mod server;

#[cfg(test)]
mod classifier_tests;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classifier::MOCK_MODEL_VERSION;
pub use classifier::MockMode;
pub use server::MockBehavior;
pub use server::MockError;
pub use server::MockServerHandle;
pub use server::serve;
pub use server::spawn_mock;
