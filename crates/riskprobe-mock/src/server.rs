// crates/riskprobe-mock/src/server.rs
// ============================================================================
// Module: Mock Server
// Description: HTTP surface for the mock inference API.
// Purpose: Serve the classifier in-process (tests, USE_MOCK) or standalone.
// Dependencies: axum, tokio, tracing
// ============================================================================

//! ## Overview
//! The in-process server binds `127.0.0.1:0` on its own thread with a
//! current-thread runtime and shuts down gracefully when its
//! [`MockServerHandle`] is dropped. The standalone server runs on the caller's
//! runtime until Ctrl-C.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tokio::time::sleep;

use crate::classifier;
use crate::classifier::MockMode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default inference route.
pub const DEFAULT_INFER_PATH: &str = "/v1/model/infer";
/// Largest accepted request body; larger bodies receive HTTP 413.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Mock server failures.
#[derive(Debug, Error)]
pub enum MockError {
    /// Listener could not be bound or configured.
    #[error("mock bind failed: {0}")]
    Bind(String),
    /// Server loop failed.
    #[error("mock server failed: {0}")]
    Serve(String),
}

// ============================================================================
// SECTION: Behavior
// ============================================================================

/// Configurable mock behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBehavior {
    /// Contract behavior.
    pub mode: MockMode,
    /// Delay applied before every reply.
    pub delay: Duration,
    /// When set, every Nth request receives HTTP 503.
    pub fail_every: Option<u64>,
    /// Route serving inference requests.
    pub infer_path: String,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            mode: MockMode::Compliant,
            delay: Duration::ZERO,
            fail_every: None,
            infer_path: DEFAULT_INFER_PATH.to_string(),
        }
    }
}

impl MockBehavior {
    /// Sets the contract mode.
    #[must_use]
    pub fn with_mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the per-reply delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fails every `n`th request with HTTP 503 (`0` disables injection).
    #[must_use]
    pub fn with_fail_every(mut self, n: u64) -> Self {
        self.fail_every = (n > 0).then_some(n);
        self
    }

    /// Sets the inference route.
    #[must_use]
    pub fn with_infer_path(mut self, path: impl Into<String>) -> Self {
        self.infer_path = path.into();
        self
    }
}

/// Shared handler state.
#[derive(Clone)]
struct MockState {
    /// Behavior applied to every request.
    behavior: Arc<MockBehavior>,
    /// Requests received so far.
    served: Arc<AtomicU64>,
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the mock router.
fn router(behavior: MockBehavior, served: Arc<AtomicU64>) -> Router {
    let path = behavior.infer_path.clone();
    let state = MockState {
        behavior: Arc::new(behavior),
        served,
    };
    Router::new()
        .route(&path, post(handle_infer))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Liveness probe.
async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok", "model_version": classifier::MOCK_MODEL_VERSION }))
}

/// Inference handler.
async fn handle_infer(State(state): State<MockState>, bytes: Bytes) -> (StatusCode, Json<Value>) {
    let sequence = state.served.fetch_add(1, Ordering::SeqCst) + 1;
    if !state.behavior.delay.is_zero() {
        sleep(state.behavior.delay).await;
    }
    if state.behavior.fail_every.is_some_and(|n| sequence % n == 0) {
        tracing::debug!(sequence, "mock injecting failure");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "detail": "injected failure" })),
        );
    }
    let body: Value = match serde_json::from_slice(bytes.as_ref()) {
        Ok(body) => body,
        Err(_) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "detail": [{ "loc": ["body"], "msg": "JSON decode error", "type": "json_invalid" }]
                })),
            );
        }
    };
    let reply = classifier::respond(&body, state.behavior.mode);
    tracing::debug!(sequence, status = reply.status, "mock replied");
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body))
}

// ============================================================================
// SECTION: In-Process Server
// ============================================================================

/// Handle for an in-process mock server; dropping it stops the server.
pub struct MockServerHandle {
    /// Base URL (`http://127.0.0.1:<port>`).
    base_url: String,
    /// Route serving inference requests.
    infer_path: String,
    /// Shutdown trigger.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server thread.
    join: Option<thread::JoinHandle<()>>,
    /// Requests received so far.
    served: Arc<AtomicU64>,
}

impl MockServerHandle {
    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the full inference endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.infer_path)
    }

    /// Returns how many inference requests the server has received.
    #[must_use]
    pub fn requests_served(&self) -> u64 {
        self.served.load(Ordering::SeqCst)
    }
}

impl Drop for MockServerHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns the mock on an ephemeral loopback port.
///
/// # Errors
///
/// Returns [`MockError::Bind`] when the listener or its runtime cannot be
/// created. The listener is registered before the server thread starts, so an
/// `Ok` handle always points at a live socket.
pub fn spawn_mock(behavior: MockBehavior) -> Result<MockServerHandle, MockError> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| MockError::Bind(format!("mock bind failed: {err}")))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| MockError::Bind(format!("mock listener nonblocking failed: {err}")))?;
    let addr = listener
        .local_addr()
        .map_err(|err| MockError::Bind(format!("mock local addr failed: {err}")))?;
    let base_url = format!("http://{addr}");
    let infer_path = behavior.infer_path.clone();
    let served = Arc::new(AtomicU64::new(0));
    let app = router(behavior, Arc::clone(&served));
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| MockError::Bind(format!("mock runtime failed: {err}")))?;
    let registered = {
        let _context = runtime.enter();
        tokio::net::TcpListener::from_std(listener)
    };
    let listener = match registered {
        Ok(listener) => listener,
        Err(err) => {
            runtime.shutdown_background();
            return Err(MockError::Bind(format!("mock listener registration failed: {err}")));
        }
    };
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        runtime.block_on(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = server.await {
                tracing::warn!(error = %err, "mock server stopped with error");
            }
        });
    });
    tracing::debug!(%addr, "mock server spawned");
    Ok(MockServerHandle {
        base_url,
        infer_path,
        shutdown: Some(shutdown_tx),
        join: Some(join),
        served,
    })
}

// ============================================================================
// SECTION: Standalone Server
// ============================================================================

/// Serves the mock on `bind` until Ctrl-C.
///
/// # Errors
///
/// Returns [`MockError`] when binding or serving fails.
pub async fn serve(bind: SocketAddr, behavior: MockBehavior) -> Result<(), MockError> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| MockError::Bind(format!("{bind}: {err}")))?;
    let local = listener.local_addr().map_err(|err| MockError::Bind(err.to_string()))?;
    tracing::info!(addr = %local, path = %behavior.infer_path, "mock inference API listening");
    let app = router(behavior, Arc::new(AtomicU64::new(0)));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|err| MockError::Serve(err.to_string()))
}
