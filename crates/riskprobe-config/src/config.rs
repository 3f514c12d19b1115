// crates/riskprobe-config/src/config.rs
// ============================================================================
// Module: Harness Configuration
// Description: Run configuration model, layering, and validation.
// Purpose: Build one immutable configuration per run, fail closed on bad input.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! [`HarnessConfig`] is resolved once per run in three layers: built-in
//! defaults, an optional TOML file, then environment overrides. The result is
//! validated and handed to the client and load harness by reference; nothing
//! downstream re-reads the environment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::env;
use crate::env::EnvLookup;
use crate::env::HarnessEnv;
use crate::env::ProcessEnv;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;
/// Upper bound on worker count for any benchmark.
pub const MAX_CONCURRENCY: usize = 512;
/// Upper bound on requests for any benchmark.
pub const MAX_REQUESTS: usize = 100_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Environment override could not be read or parsed.
    #[error("config env error: {0}")]
    Env(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: SLA Thresholds
// ============================================================================

/// Aggregate performance thresholds a benchmark must meet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SlaThresholds {
    /// Mean latency must stay below this many milliseconds.
    pub max_avg_ms: f64,
    /// p95 latency must stay below this many milliseconds.
    pub max_p95_ms: f64,
    /// Success rate must be at least this fraction.
    pub min_success_rate: f64,
    /// Throughput must be at least this many requests per second.
    pub min_throughput_rps: f64,
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            max_avg_ms: 1000.0,
            max_p95_ms: 2000.0,
            min_success_rate: 0.95,
            min_throughput_rps: 5.0,
        }
    }
}

impl SlaThresholds {
    /// Validates threshold ranges.
    fn validate(&self) -> Result<(), ConfigError> {
        positive("performance.sla.max_avg_ms", self.max_avg_ms)?;
        positive("performance.sla.max_p95_ms", self.max_p95_ms)?;
        unit_interval("performance.sla.min_success_rate", self.min_success_rate)?;
        if !self.min_throughput_rps.is_finite() || self.min_throughput_rps < 0.0 {
            return Err(ConfigError::Invalid(
                "performance.sla.min_throughput_rps must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Performance
// ============================================================================

/// Benchmark sizing and degradation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PerformanceConfig {
    /// SLA thresholds applied to every benchmark.
    pub sla: SlaThresholds,
    /// Requests per load benchmark.
    pub load_requests: usize,
    /// Workers per load benchmark.
    pub load_concurrency: usize,
    /// Requests in the sequential response-time benchmark.
    pub benchmark_requests: usize,
    /// Consecutive windows in the sustained-load check.
    pub sustained_windows: usize,
    /// Requests per sustained-load window.
    pub window_requests: usize,
    /// Later-window p95 may exceed the first window's p95 by at most this factor.
    pub degradation_ratio: f64,
    /// Absolute p95 growth below this many milliseconds is never a degradation.
    pub degradation_slack_ms: f64,
    /// Concurrency levels for the capacity sweep.
    pub capacity_levels: Vec<usize>,
    /// Requests per capacity level.
    pub capacity_requests: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            sla: SlaThresholds::default(),
            load_requests: 50,
            load_concurrency: 10,
            benchmark_requests: 20,
            sustained_windows: 3,
            window_requests: 20,
            degradation_ratio: 1.5,
            degradation_slack_ms: 50.0,
            capacity_levels: vec![1, 2, 5, 10, 15],
            capacity_requests: 20,
        }
    }
}

impl PerformanceConfig {
    /// Validates sizing and ratios.
    fn validate(&self) -> Result<(), ConfigError> {
        self.sla.validate()?;
        count("performance.load_requests", self.load_requests, MAX_REQUESTS)?;
        count("performance.load_concurrency", self.load_concurrency, MAX_CONCURRENCY)?;
        count("performance.benchmark_requests", self.benchmark_requests, MAX_REQUESTS)?;
        count("performance.sustained_windows", self.sustained_windows, MAX_REQUESTS)?;
        count("performance.window_requests", self.window_requests, MAX_REQUESTS)?;
        count("performance.capacity_requests", self.capacity_requests, MAX_REQUESTS)?;
        positive("performance.degradation_ratio", self.degradation_ratio)?;
        if !self.degradation_slack_ms.is_finite() || self.degradation_slack_ms < 0.0 {
            return Err(ConfigError::Invalid(
                "performance.degradation_slack_ms must be a non-negative number".to_string(),
            ));
        }
        if self.capacity_levels.is_empty() {
            return Err(ConfigError::Invalid(
                "performance.capacity_levels must not be empty".to_string(),
            ));
        }
        for level in &self.capacity_levels {
            count("performance.capacity_levels[]", *level, MAX_CONCURRENCY)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Harness Config
// ============================================================================

/// Immutable configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HarnessConfig {
    /// Base URL of the inference API.
    pub model_url: String,
    /// Inference endpoint path (leading `/`).
    pub infer_path: String,
    /// Per-call timeout in whole seconds.
    pub request_timeout_s: u64,
    /// Minimum confidence for an actionable classification.
    pub confidence_floor: f64,
    /// Route calls to the in-process mock instead of `model_url`.
    pub use_mock: bool,
    /// Benchmark settings.
    pub performance: PerformanceConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            model_url: "http://localhost:8000".to_string(),
            infer_path: "/v1/model/infer".to_string(),
            request_timeout_s: 10,
            confidence_floor: 0.7,
            use_mock: true,
            performance: PerformanceConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Loads defaults, the optional TOML file, and process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer fails to load or the result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, &ProcessEnv)
    }

    /// Loads configuration with a caller-supplied environment source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when any layer fails to load or the result is invalid.
    pub fn load_with(path: Option<&Path>, env: &dyn EnvLookup) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file over the defaults without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, too large, not UTF-8,
    /// or not valid TOML for this model.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides in place.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] when a set value is empty or unparseable.
    pub fn apply_env(&mut self, source: &dyn EnvLookup) -> Result<(), ConfigError> {
        let read = |key: HarnessEnv| {
            env::read_nonempty(source, key.as_str()).map_err(ConfigError::Env)
        };
        if let Some(value) = read(HarnessEnv::ModelUrl)? {
            self.model_url = value;
        }
        if let Some(value) = read(HarnessEnv::InferPath)? {
            self.infer_path = value;
        }
        if let Some(value) = read(HarnessEnv::TimeoutSeconds)? {
            let timeout = env::parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &value)
                .map_err(ConfigError::Env)?;
            self.request_timeout_s = timeout.as_secs();
        }
        if let Some(value) = read(HarnessEnv::ConfidenceFloor)? {
            self.confidence_floor =
                env::parse_bounded_f64(HarnessEnv::ConfidenceFloor.as_str(), &value, 0.0, 1.0)
                    .map_err(ConfigError::Env)?;
        }
        if let Some(value) = read(HarnessEnv::UseMock)? {
            self.use_mock =
                env::parse_bool(HarnessEnv::UseMock.as_str(), &value).map_err(ConfigError::Env)?;
        }
        if let Some(value) = read(HarnessEnv::LoadConcurrency)? {
            self.performance.load_concurrency =
                env::parse_positive_count(HarnessEnv::LoadConcurrency.as_str(), &value)
                    .map_err(ConfigError::Env)?;
        }
        if let Some(value) = read(HarnessEnv::LoadRequests)? {
            self.performance.load_requests =
                env::parse_positive_count(HarnessEnv::LoadRequests.as_str(), &value)
                    .map_err(ConfigError::Env)?;
        }
        if let Some(value) = read(HarnessEnv::MinThroughput)? {
            self.performance.sla.min_throughput_rps =
                env::parse_bounded_f64(HarnessEnv::MinThroughput.as_str(), &value, 0.0, f64::MAX)
                    .map_err(ConfigError::Env)?;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(self.model_url.trim())
            .map_err(|err| ConfigError::Invalid(format!("model_url is not a valid URL: {err}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("model_url must use http:// or https://".to_string()));
        }
        if base.host_str().is_none() {
            return Err(ConfigError::Invalid("model_url must include a host".to_string()));
        }
        if !self.infer_path.starts_with('/') {
            return Err(ConfigError::Invalid("infer_path must start with `/`".to_string()));
        }
        if self.request_timeout_s == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_s must be greater than zero".to_string(),
            ));
        }
        unit_interval("confidence_floor", self.confidence_floor)?;
        self.performance.validate()?;
        self.endpoint().map(|_| ())
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }

    /// Joins `model_url` and `infer_path` into the inference endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the joined URL does not parse.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        endpoint_url(&self.model_url, &self.infer_path)
    }

    /// Returns a copy routed at a different base URL (used when a mock is spawned).
    #[must_use]
    pub fn with_model_url(&self, model_url: impl Into<String>) -> Self {
        Self {
            model_url: model_url.into(),
            ..self.clone()
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Joins a base URL and an absolute path.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the joined URL does not parse.
pub fn endpoint_url(model_url: &str, infer_path: &str) -> Result<Url, ConfigError> {
    let joined = format!("{}{}", model_url.trim().trim_end_matches('/'), infer_path.trim());
    Url::parse(&joined)
        .map_err(|err| ConfigError::Invalid(format!("endpoint `{joined}` is not a valid URL: {err}")))
}

/// Rejects non-finite or non-positive values.
fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be a positive number")))
    }
}

/// Rejects values outside `[0, 1]`.
fn unit_interval(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field} must be between 0 and 1")))
    }
}

/// Rejects zero and values above `max`.
fn count(field: &str, value: usize, max: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
    }
    if value > max {
        return Err(ConfigError::Invalid(format!("{field} must be at most {max}")));
    }
    Ok(())
}
