// crates/riskprobe-core/src/outcome.rs
// ============================================================================
// Module: Test Outcomes
// Description: Priority tiers, selection tags, call traces, and test outcomes.
// Purpose: Give the report aggregator an immutable per-test record.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`TestOutcome`] is created once per test invocation and never mutated
//! afterwards. It carries the request/response traces the test produced so a
//! failure can be diagnosed without re-running anything.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Priority and Tags
// ============================================================================

/// Test priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Critical.
    P0,
    /// High.
    P1,
    /// Medium.
    P2,
}

impl Priority {
    /// Returns the selection tag matching this priority.
    #[must_use]
    pub const fn tag(self) -> Tag {
        match self {
            Self::P0 => Tag::P0,
            Self::P1 => Tag::P1,
            Self::P2 => Tag::P2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tag().fmt(f)
    }
}

/// Selection tag used by the CLI (`p0`, `p1`, `p2`, `performance`, `load`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Critical-priority cases.
    P0,
    /// High-priority cases.
    P1,
    /// Medium-priority cases.
    P2,
    /// Latency/throughput benchmarks.
    Performance,
    /// Concurrent load cases.
    Load,
}

impl Tag {
    /// Returns the canonical tag label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "p0",
            Self::P1 => "p1",
            Self::P2 => "p2",
            Self::Performance => "performance",
            Self::Load => "load",
        }
    }

    /// Parses a tag label (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        [Self::P0, Self::P1, Self::P2, Self::Performance, Self::Load]
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Traces
// ============================================================================

/// One request/response exchange recorded by a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTrace {
    /// Request body as sent.
    pub request: Value,
    /// HTTP status, absent on transport failure.
    pub status: Option<u16>,
    /// Response body; JSON when parseable, otherwise the raw text as a string.
    pub response: Option<Value>,
    /// Wall-clock latency in milliseconds.
    pub elapsed_ms: f64,
    /// Transport error message when the call failed before a response.
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Immutable result of one test invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Test name.
    name: String,
    /// Priority tier.
    priority: Priority,
    /// Selection tags the test carries.
    tags: Vec<Tag>,
    /// Whether every assertion held.
    passed: bool,
    /// Diagnostic message (the first violated assertion on failure).
    detail: String,
    /// Request/response exchanges in call order.
    traces: Vec<CallTrace>,
}

impl TestOutcome {
    /// Records a passing outcome.
    #[must_use]
    pub fn pass(
        name: impl Into<String>,
        priority: Priority,
        tags: Vec<Tag>,
        detail: impl Into<String>,
        traces: Vec<CallTrace>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            tags,
            passed: true,
            detail: detail.into(),
            traces,
        }
    }

    /// Records a failing outcome.
    #[must_use]
    pub fn fail(
        name: impl Into<String>,
        priority: Priority,
        tags: Vec<Tag>,
        detail: impl Into<String>,
        traces: Vec<CallTrace>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            tags,
            passed: false,
            detail: detail.into(),
            traces,
        }
    }

    /// Returns the test name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the priority tier.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the selection tags.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Returns true when the test passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the diagnostic detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns the recorded traces.
    #[must_use]
    pub fn traces(&self) -> &[CallTrace] {
        &self.traces
    }
}
