// crates/riskprobe-config/src/lib.rs
// ============================================================================
// Module: riskprobe Config Library
// Description: Run configuration model, environment parsing, and validation.
// Purpose: Single source of truth for harness settings.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! `riskprobe-config` resolves the harness configuration (target endpoint,
//! timeout, confidence floor, mock routing, SLA thresholds) once per run and
//! fails closed on malformed input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::HarnessConfig;
pub use config::PerformanceConfig;
pub use config::SlaThresholds;
pub use env::EnvLookup;
pub use env::HarnessEnv;
pub use env::ProcessEnv;
