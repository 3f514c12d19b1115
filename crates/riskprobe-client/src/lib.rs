// crates/riskprobe-client/src/lib.rs
// ============================================================================
// Module: riskprobe Client
// Description: HTTP client for the risk-classification inference endpoint.
// Purpose: Send one request, time it, and capture status and body verbatim.
// Dependencies: reqwest, riskprobe-config, riskprobe-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! [`ModelClient`] posts a JSON body to the configured endpoint exactly once
//! and returns a [`ModelCall`] holding the status, raw body text, parsed JSON
//! (when the body parses), and wall-clock latency. Non-2xx statuses are
//! results, not errors; only transport failures surface as
//! [`TransportError`]. There are no retries: a failed call is evidence.
//!
//! Request and response bodies may contain PHI and are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use reqwest::Client;
use riskprobe_config::ConfigError;
use riskprobe_config::HarnessConfig;
use riskprobe_core::CallTrace;
use riskprobe_core::RequestPayload;
use serde_json::Value;
use thiserror::Error;
use url::Url;


// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures before an HTTP status was received.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Client construction failed.
    #[error("http client build failed: {0}")]
    Build(String),
    /// Endpoint configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The request exceeded the configured timeout.
    #[error("request timed out after {0:.3}s")]
    Timeout(f64),
    /// The endpoint could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other send failure.
    #[error("request failed: {0}")]
    Request(String),
    /// The response body could not be read.
    #[error("response body read failed: {0}")]
    Body(String),
}

impl TransportError {
    /// Maps a reqwest send failure into a transport error.
    fn from_send(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout.as_secs_f64())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

// ============================================================================
// SECTION: Call Result
// ============================================================================

/// Outcome of one HTTP exchange that produced a status.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub raw_body: String,
    /// Parsed response body, when it is JSON.
    pub body: Option<Value>,
    /// Wall-clock latency of the exchange.
    pub elapsed: Duration,
}

impl ModelCall {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns latency in fractional milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Builds the trace recorded for this exchange.
    #[must_use]
    pub fn trace(&self, request: Value) -> CallTrace {
        CallTrace {
            request,
            status: Some(self.status),
            response: Some(
                self.body.clone().unwrap_or_else(|| Value::String(self.raw_body.clone())),
            ),
            elapsed_ms: self.elapsed_ms(),
            error: None,
        }
    }
}

/// Builds the trace recorded for a transport failure.
#[must_use]
pub fn failed_trace(request: Value, error: &TransportError, elapsed: Duration) -> CallTrace {
    CallTrace {
        request,
        status: None,
        response: None,
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        error: Some(error.to_string()),
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Single-attempt client bound to one inference endpoint.
#[derive(Debug, Clone)]
pub struct ModelClient {
    /// Full inference URL.
    endpoint: Url,
    /// Pooled HTTP client.
    client: Client,
    /// Per-request timeout.
    timeout: Duration,
}

impl ModelClient {
    /// Creates a client for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Build`] when the HTTP client cannot be built.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Build(err.to_string()))?;
        Ok(Self {
            endpoint,
            client,
            timeout,
        })
    }

    /// Creates a client from harness configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the endpoint is invalid or the client
    /// cannot be built.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, TransportError> {
        Self::new(config.endpoint()?, config.request_timeout())
    }

    /// Returns the inference endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts `body` once and captures the exchange.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP status was received or the body
    /// could not be read.
    pub async fn call_model(&self, body: &Value) -> Result<ModelCall, TransportError> {
        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| TransportError::from_send(&err, self.timeout))?;
        let status = response.status().as_u16();
        let raw_body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout(self.timeout.as_secs_f64())
            } else {
                TransportError::Body(err.to_string())
            }
        })?;
        let elapsed = started.elapsed();
        let body = serde_json::from_str(&raw_body).ok();
        tracing::debug!(status, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "model call");
        Ok(ModelCall {
            status,
            raw_body,
            body,
            elapsed,
        })
    }

    /// Posts a request payload once.
    ///
    /// # Errors
    ///
    /// See [`ModelClient::call_model`].
    pub async fn call_payload(&self, payload: &RequestPayload) -> Result<ModelCall, TransportError> {
        self.call_model(&payload.to_json()).await
    }

    /// Posts `body` once and returns the recorded trace with the call result.
    ///
    /// Transport failures are folded into the trace so callers can report
    /// them alongside successful exchanges.
    pub async fn traced_call(&self, body: Value) -> (CallTrace, Result<ModelCall, TransportError>) {
        let started = Instant::now();
        match self.call_model(&body).await {
            Ok(call) => (call.trace(body), Ok(call)),
            Err(err) => {
                tracing::warn!(error = %err, "model call failed");
                (failed_trace(body, &err, started.elapsed()), Err(err))
            }
        }
    }
}
