// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: riskprobe-config
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid
//! silent misconfiguration. Invalid UTF-8 and empty values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use riskprobe_config::EnvLookup;
use riskprobe_config::ProcessEnv;
use riskprobe_config::env::parse_timeout_seconds;
use riskprobe_config::env::read_nonempty;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Base URL of a live inference API; live suites are skipped when unset.
    LiveModelUrl,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
    /// Directory that keeps run reports instead of a temporary directory.
    ReportDir,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LiveModelUrl => "RISKPROBE_SYSTEM_TEST_MODEL_URL",
            Self::TimeoutSeconds => "RISKPROBE_SYSTEM_TEST_TIMEOUT_SEC",
            Self::ReportDir => "RISKPROBE_SYSTEM_TEST_REPORT_DIR",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Live endpoint base URL.
    pub live_model_url: Option<String>,
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
    /// Persistent report directory.
    pub report_dir: Option<PathBuf>,
}

impl SystemTestConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not valid UTF-8, is empty, or fails
    /// validation.
    pub fn load() -> Result<Self, String> {
        Self::load_with(&ProcessEnv)
    }

    /// Loads configuration from `env`.
    ///
    /// # Errors
    ///
    /// Returns an error when a value is unreadable, empty, or invalid.
    pub fn load_with(env: &dyn EnvLookup) -> Result<Self, String> {
        let live_model_url = read_nonempty(env, SystemTestEnv::LiveModelUrl.as_str())?;
        let timeout = read_nonempty(env, SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        let report_dir =
            read_nonempty(env, SystemTestEnv::ReportDir.as_str())?.map(PathBuf::from);
        Ok(Self {
            live_model_url,
            timeout,
            report_dir,
        })
    }
}
