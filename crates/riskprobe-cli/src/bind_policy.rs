// crates/riskprobe-cli/src/bind_policy.rs
// ============================================================================
// Module: Mock Bind Policy
// Description: Network exposure checks for the standalone mock server.
// Purpose: Keep the stub on loopback unless exposure is explicitly requested.
// Dependencies: riskprobe-config, thiserror
// ============================================================================

//! ## Overview
//! The mock answers with synthetic clinical classifications and has no auth,
//! so binding it to a routable address requires `--allow-non-loopback` or
//! [`ALLOW_NON_LOOPBACK_ENV`]. The policy fails closed on unparsable binds
//! and unrecognized environment values.

use std::net::SocketAddr;

use riskprobe_config::EnvLookup;
use riskprobe_config::env::parse_bool;
use thiserror::Error;

/// Environment variable enabling non-loopback mock binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "RISKPROBE_ALLOW_NON_LOOPBACK";

/// Resolved bind address and its exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOutcome {
    /// Address to bind.
    pub addr: SocketAddr,
    /// True when the address is reachable beyond loopback.
    pub network_exposed: bool,
}

/// Bind policy failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindPolicyError {
    /// The opt-in environment variable holds an unrecognized value.
    #[error("invalid {ALLOW_NON_LOOPBACK_ENV}: {0}")]
    InvalidEnv(String),
    /// The bind string is not a socket address.
    #[error("invalid bind address {bind}: {error}")]
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// A non-loopback bind was requested without opt-in.
    #[error(
        "refusing to bind the mock to non-loopback address {bind}; pass --allow-non-loopback or \
         set {ALLOW_NON_LOOPBACK_ENV}=1"
    )]
    NonLoopbackOptInRequired {
        /// Raw bind value.
        bind: String,
    },
}

/// Resolves the non-loopback opt-in from the CLI flag and environment.
///
/// # Errors
///
/// Returns [`BindPolicyError::InvalidEnv`] when the variable is unreadable or
/// not a boolean literal.
pub fn resolve_allow_non_loopback(flag: bool, env: &dyn EnvLookup) -> Result<bool, BindPolicyError> {
    if flag {
        return Ok(true);
    }
    match env.lookup(ALLOW_NON_LOOPBACK_ENV).map_err(BindPolicyError::InvalidEnv)? {
        Some(raw) => parse_bool(ALLOW_NON_LOOPBACK_ENV, &raw).map_err(BindPolicyError::InvalidEnv),
        None => Ok(false),
    }
}

/// Parses `bind` and rejects routable addresses unless `allow_non_loopback`.
///
/// # Errors
///
/// Returns [`BindPolicyError`] when the address is malformed or exposed
/// without opt-in.
pub fn enforce_local_only(bind: &str, allow_non_loopback: bool) -> Result<BindOutcome, BindPolicyError> {
    let addr: SocketAddr = bind.trim().parse().map_err(|err: std::net::AddrParseError| {
        BindPolicyError::InvalidBind {
            bind: bind.to_string(),
            error: err.to_string(),
        }
    })?;
    let network_exposed = !addr.ip().is_loopback();
    if network_exposed && !allow_non_loopback {
        return Err(BindPolicyError::NonLoopbackOptInRequired {
            bind: bind.to_string(),
        });
    }
    Ok(BindOutcome {
        addr,
        network_exposed,
    })
}
