// crates/riskprobe-core/src/lib.rs
// ============================================================================
// Module: riskprobe Core Library
// Description: Wire model, contract assertions, and scenario generators.
// Purpose: Decide PASS/FAIL for risk-classification responses without I/O.
// Dependencies: jsonschema, regex, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! `riskprobe-core` holds everything that decides whether a single response
//! from a cardiac-risk inference endpoint honors its contract: the typed wire
//! model, side-effect-free assertions, PHI detection, and the deterministic
//! scenario generators that produce request variants with expected outcomes.
//!
//! Nothing in this crate performs network or filesystem access; callers hand
//! in request payloads and response bodies and receive a `Result`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod assertions;
pub mod model;
pub mod outcome;
pub mod phi;
pub mod scenarios;

#[cfg(test)]
mod assertions_tests;
#[cfg(test)]
mod phi_tests;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use assertions::ContractError;
pub use assertions::EchoPolicy;
pub use assertions::FeatureVocabulary;
pub use model::Explanation;
pub use model::InferenceRequest;
pub use model::InferenceResponse;
pub use model::RequestPayload;
pub use model::RiskLabel;
pub use outcome::CallTrace;
pub use outcome::Priority;
pub use outcome::Tag;
pub use outcome::TestOutcome;
pub use phi::PhiKind;
pub use phi::PhiToken;
pub use scenarios::ConfidenceBand;
pub use scenarios::Expectation;
pub use scenarios::Scenario;
pub use scenarios::ScenarioCategory;
pub use scenarios::SeveritySeries;
pub use scenarios::StabilityPolicy;
pub use scenarios::Variant;
pub use scenarios::VariantGroup;
