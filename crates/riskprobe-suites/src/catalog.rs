// crates/riskprobe-suites/src/catalog.rs
// ============================================================================
// Module: Test Catalog
// Description: Test cases as data, tagged for selection.
// Purpose: Compose scenario generators and load plans into named cases.
// Dependencies: riskprobe-config, riskprobe-core
// ============================================================================

//! ## Overview
//! Every runnable check is a [`TestCase`]: a stable name, a priority, the
//! selection tags it answers to, and a [`CaseKind`] describing what to run.
//! The catalog is rebuilt from the generators for every run, so no case sees
//! another's fixtures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use riskprobe_config::PerformanceConfig;
use riskprobe_core::InferenceRequest;
use riskprobe_core::Priority;
use riskprobe_core::Scenario;
use riskprobe_core::SeveritySeries;
use riskprobe_core::Tag;
use riskprobe_core::VariantGroup;
use riskprobe_core::scenarios;

// ============================================================================
// SECTION: Types
// ============================================================================

/// What a test case runs.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseKind {
    /// One request judged by its expectation and the privacy checks.
    Scenario(Scenario),
    /// Canonical request plus variants compared under a stability policy.
    Variants(VariantGroup),
    /// Ordered severity steps whose confidence must not decrease.
    Gradient(SeveritySeries),
    /// The same request twice; both must carry the same class.
    Idempotence(InferenceRequest),
    /// Sequential response-time benchmark.
    Benchmark {
        /// Calls issued.
        requests: usize,
    },
    /// Concurrent load against the SLA.
    Load {
        /// Calls issued.
        requests: usize,
        /// Worker count.
        concurrency: usize,
    },
    /// Back-to-back windows checked for p95 degradation.
    Sustained {
        /// Window count.
        windows: usize,
        /// Calls per window.
        requests_per_window: usize,
        /// Worker count.
        concurrency: usize,
    },
    /// Throughput sweep across concurrency levels.
    CapacitySweep {
        /// Concurrency levels in sweep order.
        levels: Vec<usize>,
        /// Calls per level.
        requests_per_level: usize,
    },
}

/// One runnable, selectable check.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Stable case name.
    pub name: String,
    /// Priority tier.
    pub priority: Priority,
    /// Selection tags, always including the priority tag.
    pub tags: Vec<Tag>,
    /// What to run.
    pub kind: CaseKind,
}

impl TestCase {
    /// Builds a case tagged with its priority plus `extra` tags.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: Priority, extra: &[Tag], kind: CaseKind) -> Self {
        let mut tags = vec![priority.tag()];
        tags.extend(extra.iter().copied().filter(|tag| *tag != priority.tag()));
        Self {
            name: name.into(),
            priority,
            tags,
            kind,
        }
    }

    /// Returns true when the case carries any of `selected` (empty selects all).
    #[must_use]
    pub fn matches(&self, selected: &[Tag]) -> bool {
        selected.is_empty() || self.tags.iter().any(|tag| selected.contains(tag))
    }

    /// Returns true for cases driven by the load harness.
    #[must_use]
    pub const fn is_performance(&self) -> bool {
        matches!(
            self.kind,
            CaseKind::Benchmark { .. }
                | CaseKind::Load { .. }
                | CaseKind::Sustained { .. }
                | CaseKind::CapacitySweep { .. }
        )
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Builds every case in run order: compliance, variation, then performance.
#[must_use]
pub fn catalog(performance: &PerformanceConfig) -> Vec<TestCase> {
    let mut cases: Vec<TestCase> = scenarios::single_request_scenarios()
        .into_iter()
        .map(|scenario| {
            TestCase::new(scenario.name, scenario.priority, &[], CaseKind::Scenario(scenario))
        })
        .collect();
    cases.push(TestCase::new(
        "canonical_is_idempotent",
        Priority::P1,
        &[],
        CaseKind::Idempotence(scenarios::canonical_request()),
    ));
    cases.extend(scenarios::variant_groups().into_iter().map(|group| {
        TestCase::new(group.name, group.priority, &[], CaseKind::Variants(group))
    }));
    let gradient = scenarios::confidence_gradient();
    cases.push(TestCase::new(gradient.name, gradient.priority, &[], CaseKind::Gradient(gradient)));
    cases.extend(performance_cases(performance));
    cases
}

/// Builds the load-harness cases from performance settings.
fn performance_cases(performance: &PerformanceConfig) -> Vec<TestCase> {
    vec![
        TestCase::new(
            "response_time_benchmark",
            Priority::P1,
            &[Tag::Performance],
            CaseKind::Benchmark {
                requests: performance.benchmark_requests,
            },
        ),
        TestCase::new(
            "concurrent_load",
            Priority::P1,
            &[Tag::Performance, Tag::Load],
            CaseKind::Load {
                requests: performance.load_requests,
                concurrency: performance.load_concurrency,
            },
        ),
        TestCase::new(
            "sustained_load_stability",
            Priority::P2,
            &[Tag::Load],
            CaseKind::Sustained {
                windows: performance.sustained_windows,
                requests_per_window: performance.window_requests,
                concurrency: performance.load_concurrency,
            },
        ),
        TestCase::new(
            "throughput_capacity",
            Priority::P2,
            &[Tag::Performance, Tag::Load],
            CaseKind::CapacitySweep {
                levels: performance.capacity_levels.clone(),
                requests_per_level: performance.capacity_requests,
            },
        ),
    ]
}

/// Returns the catalog cases matching `selected` tags, in catalog order.
#[must_use]
pub fn select(performance: &PerformanceConfig, selected: &[Tag]) -> Vec<TestCase> {
    catalog(performance).into_iter().filter(|case| case.matches(selected)).collect()
}
