// crates/riskprobe-config/src/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment keys and strict value parsing.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 and empty values fail closed. Lookups go
//! through an [`EnvLookup`] so callers can substitute a fixed map for the
//! process environment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys recognized by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HarnessEnv {
    /// Base URL of the inference API.
    ModelUrl,
    /// Inference endpoint path.
    InferPath,
    /// Per-call timeout in seconds (positive integer).
    TimeoutSeconds,
    /// Minimum confidence for an actionable classification.
    ConfidenceFloor,
    /// Route calls to the in-process mock (`true`/`false` or `1`/`0`).
    UseMock,
    /// Worker count for load cases.
    LoadConcurrency,
    /// Total requests for load cases.
    LoadRequests,
    /// Minimum acceptable throughput in requests per second.
    MinThroughput,
}

impl HarnessEnv {
    /// Every recognized key.
    pub const ALL: [Self; 8] = [
        Self::ModelUrl,
        Self::InferPath,
        Self::TimeoutSeconds,
        Self::ConfidenceFloor,
        Self::UseMock,
        Self::LoadConcurrency,
        Self::LoadRequests,
        Self::MinThroughput,
    ];

    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModelUrl => "MODEL_URL",
            Self::InferPath => "MODEL_INFER_PATH",
            Self::TimeoutSeconds => "REQUEST_TIMEOUT_S",
            Self::ConfidenceFloor => "CONFIDENCE_FLOOR",
            Self::UseMock => "USE_MOCK",
            Self::LoadConcurrency => "LOAD_CONCURRENCY",
            Self::LoadRequests => "LOAD_REQUESTS",
            Self::MinThroughput => "MIN_THROUGHPUT_RPS",
        }
    }
}

// ============================================================================
// SECTION: Lookup
// ============================================================================

/// Source of raw environment values.
pub trait EnvLookup {
    /// Returns the raw value for `name`, or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is set but unreadable (for example, not UTF-8).
    fn lookup(&self, name: &str) -> Result<Option<String>, String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Result<Option<String>, String> {
        read_env_strict(name)
    }
}

impl EnvLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Result<Option<String>, String> {
        Ok(self.get(name).cloned())
    }
}

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads a key and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
pub fn read_nonempty(env: &dyn EnvLookup, name: &str) -> Result<Option<String>, String> {
    match env.lookup(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

// ============================================================================
// SECTION: Parsers
// ============================================================================

/// Parses a positive timeout value in whole seconds.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
pub fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a positive integer count.
///
/// # Errors
///
/// Returns an error when the value is non-numeric or zero.
pub fn parse_positive_count(name: &str, raw: &str) -> Result<usize, String> {
    let value: usize =
        raw.trim().parse().map_err(|_| format!("{name} must be a positive integer"))?;
    if value == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(value)
}

/// Parses a finite number within `[min, max]`.
///
/// # Errors
///
/// Returns an error when the value is not a finite number in range.
pub fn parse_bounded_f64(name: &str, raw: &str, min: f64, max: f64) -> Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|_| format!("{name} must be a number"))?;
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{name} must be between {min} and {max}"));
    }
    Ok(value)
}

/// Parses a boolean literal (`1`, `0`, `true`, `false`).
///
/// # Errors
///
/// Returns an error when the value is not a recognized boolean literal.
pub fn parse_bool(name: &str, raw: &str) -> Result<bool, String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
        return Ok(false);
    }
    Err(format!("{name} must be 1, 0, true, or false"))
}
