// crates/riskprobe-suites/src/session.rs
// ============================================================================
// Module: Harness Session
// Description: Binds a run to a live endpoint or an in-process mock.
// Purpose: Own the mock lifetime and the shared client for one run.
// Dependencies: riskprobe-client, riskprobe-config, riskprobe-mock, tracing
// ============================================================================

//! ## Overview
//! A [`HarnessSession`] is built once per run from an immutable
//! [`HarnessConfig`]. When `use_mock` is set it spawns the mock on a loopback
//! port and routes the client there; the mock stops when the session drops.

// ============================================================================
// SECTION: Imports
// ============================================================================

use riskprobe_client::ModelClient;
use riskprobe_client::TransportError;
use riskprobe_config::HarnessConfig;
use riskprobe_mock::MockBehavior;
use riskprobe_mock::MockError;
use riskprobe_mock::MockServerHandle;
use riskprobe_mock::spawn_mock;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Session setup failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The in-process mock could not start.
    #[error(transparent)]
    Mock(#[from] MockError),
    /// The client could not be built.
    #[error(transparent)]
    Client(#[from] TransportError),
}

// ============================================================================
// SECTION: Session
// ============================================================================

/// Configuration, client, and optional mock for one run.
pub struct HarnessSession {
    /// Effective configuration (routed at the mock when one is running).
    config: HarnessConfig,
    /// Endpoint client.
    client: ModelClient,
    /// Running mock, when `use_mock` is set.
    mock: Option<MockServerHandle>,
}

impl HarnessSession {
    /// Starts a session, spawning the default mock when `use_mock` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the mock or client cannot start.
    pub fn start(config: &HarnessConfig) -> Result<Self, SessionError> {
        let behavior = MockBehavior::default().with_infer_path(config.infer_path.clone());
        Self::start_with(config, behavior)
    }

    /// Starts a session with a specific mock behavior (ignored for live runs).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the mock or client cannot start.
    pub fn start_with(config: &HarnessConfig, behavior: MockBehavior) -> Result<Self, SessionError> {
        if !config.use_mock {
            tracing::info!(endpoint = %config.model_url, "using live endpoint");
            return Ok(Self {
                config: config.clone(),
                client: ModelClient::from_config(config)?,
                mock: None,
            });
        }
        let behavior = behavior.with_infer_path(config.infer_path.clone());
        let mock = spawn_mock(behavior)?;
        let config = config.with_model_url(mock.base_url());
        tracing::info!(endpoint = %mock.endpoint(), "using in-process mock");
        Ok(Self {
            client: ModelClient::from_config(&config)?,
            config,
            mock: Some(mock),
        })
    }

    /// Returns the effective configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the endpoint client.
    #[must_use]
    pub const fn client(&self) -> &ModelClient {
        &self.client
    }

    /// Returns the running mock, if any.
    #[must_use]
    pub const fn mock(&self) -> Option<&MockServerHandle> {
        self.mock.as_ref()
    }
}
