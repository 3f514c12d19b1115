// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: Session Harness
// Description: Builders for harness sessions in system-tests.
// Purpose: Provide deterministic mock startup and teardown per test.
// Dependencies: riskprobe-config, riskprobe-mock, riskprobe-suites
// ============================================================================

use std::collections::BTreeMap;

use riskprobe_config::HarnessConfig;
use riskprobe_mock::MockBehavior;
use riskprobe_suites::HarnessSession;
use system_tests::config::SystemTestConfig;

/// Loads the system-test environment, failing the test on bad values.
pub fn system_config() -> SystemTestConfig {
    SystemTestConfig::load().unwrap_or_else(|err| panic!("system-test env: {err}"))
}

/// Builds a mock-backed configuration from built-in defaults.
pub fn mock_config() -> HarnessConfig {
    let mut config = HarnessConfig::load_with(None, &BTreeMap::<String, String>::new())
        .unwrap_or_else(|err| panic!("default config: {err}"));
    config.use_mock = true;
    if let Some(timeout) = system_config().timeout {
        config.request_timeout_s = timeout.as_secs();
    }
    config
}

/// Builds a live configuration when a live endpoint is configured.
pub fn live_config() -> Option<HarnessConfig> {
    let system = system_config();
    let url = system.live_model_url?;
    let mut config = mock_config().with_model_url(url);
    config.use_mock = false;
    Some(config)
}

/// Starts a session backed by the compliant mock.
pub fn compliant_session() -> HarnessSession {
    mock_session(MockBehavior::default())
}

/// Starts a session backed by a mock with `behavior`.
pub fn mock_session(behavior: MockBehavior) -> HarnessSession {
    HarnessSession::start_with(&mock_config(), behavior)
        .unwrap_or_else(|err| panic!("start mock session: {err}"))
}

/// Starts a session against `config` as given.
pub fn session_for(config: &HarnessConfig) -> HarnessSession {
    HarnessSession::start(config).unwrap_or_else(|err| panic!("start session: {err}"))
}
