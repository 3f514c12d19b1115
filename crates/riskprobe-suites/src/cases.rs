// crates/riskprobe-suites/src/cases.rs
// ============================================================================
// Module: Case Execution
// Description: Runs one test case against the endpoint and judges it.
// Purpose: Compose client calls, contract assertions, and load checks.
// Dependencies: riskprobe-client, riskprobe-core, riskprobe-load, tracing
// ============================================================================

//! ## Overview
//! [`execute`] runs one [`TestCase`] and returns a diagnostic detail on pass
//! or a [`CaseFailure`] naming the first violated check. Every exchange is
//! recorded in the [`CaseRecorder`] as it happens, so failing cases still
//! carry their traces and benchmark statistics into the report.
//!
//! Privacy checks apply to every HTTP 200 body. Validation-error bodies are
//! outside the response contract and are judged by status alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use riskprobe_client::ModelCall;
use riskprobe_client::ModelClient;
use riskprobe_client::TransportError;
use riskprobe_config::HarnessConfig;
use riskprobe_core::CallTrace;
use riskprobe_core::ContractError;
use riskprobe_core::EchoPolicy;
use riskprobe_core::FeatureVocabulary;
use riskprobe_core::InferenceRequest;
use riskprobe_core::InferenceResponse;
use riskprobe_core::RequestPayload;
use riskprobe_core::Scenario;
use riskprobe_core::SeveritySeries;
use riskprobe_core::VariantGroup;
use riskprobe_core::assertions;
use riskprobe_core::scenarios;
use riskprobe_load::LatencyStats;
use riskprobe_load::LoadError;
use riskprobe_load::SlaViolation;
use riskprobe_load::Workload;
use thiserror::Error;

use crate::catalog::CaseKind;
use crate::catalog::TestCase;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Why a test case failed.
#[derive(Debug, Error)]
pub enum CaseFailure {
    /// A contract assertion or expectation failed.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// One variant of a group failed.
    #[error("variant `{label}`: {source}")]
    Variant {
        /// Variant label.
        label: &'static str,
        /// Underlying failure.
        #[source]
        source: ContractError,
    },
    /// The endpoint could not be reached during a compliance case.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Aggregate performance breached its thresholds.
    #[error(transparent)]
    Sla(#[from] SlaViolation),
    /// The load harness could not run.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// No capacity level met the success-rate requirement.
    #[error("no concurrency level reached the required success rate")]
    NoHealthyCapacity,
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Shared, read-only inputs for case execution.
#[derive(Debug, Clone)]
pub struct CaseContext<'a> {
    /// Endpoint client.
    pub client: &'a ModelClient,
    /// Run configuration.
    pub config: &'a HarnessConfig,
    /// Vocabulary for explanation feature names.
    pub vocabulary: FeatureVocabulary,
}

impl<'a> CaseContext<'a> {
    /// Builds a context with the default clinical vocabulary.
    #[must_use]
    pub fn new(client: &'a ModelClient, config: &'a HarnessConfig) -> Self {
        Self {
            client,
            config,
            vocabulary: FeatureVocabulary::default(),
        }
    }
}

/// Evidence collected while one case runs.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CaseRecorder {
    /// Exchanges in call order.
    pub traces: Vec<CallTrace>,
    /// Named benchmark statistics.
    pub benchmarks: BTreeMap<String, LatencyStats>,
}

impl CaseRecorder {
    /// Posts `body` once and records the exchange.
    async fn call(
        &mut self,
        client: &ModelClient,
        body: serde_json::Value,
    ) -> Result<ModelCall, TransportError> {
        let (trace, result) = client.traced_call(body).await;
        self.traces.push(trace);
        result
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Runs one case, recording evidence into `recorder`.
///
/// # Errors
///
/// Returns the first [`CaseFailure`] the case hits.
pub async fn execute(
    context: &CaseContext<'_>,
    case: &TestCase,
    recorder: &mut CaseRecorder,
) -> Result<String, CaseFailure> {
    match &case.kind {
        CaseKind::Scenario(scenario) => run_scenario(context, scenario, recorder).await,
        CaseKind::Variants(group) => run_variants(context, group, recorder).await,
        CaseKind::Gradient(series) => run_gradient(context, series, recorder).await,
        CaseKind::Idempotence(request) => run_idempotence(context, request, recorder).await,
        CaseKind::Benchmark {
            requests,
        } => {
            let workload = Workload::single(&scenarios::canonical_request());
            let stats =
                riskprobe_load::run_benchmark(context.client, &workload, *requests, 1).await?;
            recorder.benchmarks.insert(case.name.clone(), stats.clone());
            riskprobe_load::assert_sla(&stats, &context.config.performance.sla)?;
            Ok(describe_stats(&stats))
        }
        CaseKind::Load {
            requests,
            concurrency,
        } => {
            let workload = Workload::varied(*requests);
            let stats =
                riskprobe_load::run_benchmark(context.client, &workload, *requests, *concurrency)
                    .await?;
            recorder.benchmarks.insert(case.name.clone(), stats.clone());
            riskprobe_load::assert_sla(&stats, &context.config.performance.sla)?;
            Ok(describe_stats(&stats))
        }
        CaseKind::Sustained {
            windows,
            requests_per_window,
            concurrency,
        } => {
            run_sustained(context, case, *windows, *requests_per_window, *concurrency, recorder)
                .await
        }
        CaseKind::CapacitySweep {
            levels,
            requests_per_level,
        } => run_capacity(context, case, levels, *requests_per_level, recorder).await,
    }
}

// ============================================================================
// SECTION: Compliance Cases
// ============================================================================

/// Judges one scenario: expectation first, then privacy on HTTP 200 bodies.
async fn run_scenario(
    context: &CaseContext<'_>,
    scenario: &Scenario,
    recorder: &mut CaseRecorder,
) -> Result<String, CaseFailure> {
    let call = recorder.call(context.client, scenario.request.to_json()).await?;
    let response = scenario.expectation.verify(
        call.status,
        call.body.as_ref(),
        context.config.confidence_floor,
        &context.vocabulary,
    )?;
    if call.status == 200 {
        check_privacy(&scenario.request, &call)?;
    }
    Ok(describe_call(&call, response.as_ref()))
}

/// Runs both echo checks against one exchange.
fn check_privacy(request: &RequestPayload, call: &ModelCall) -> Result<(), ContractError> {
    assertions::assert_no_phi_echo(request, &call.raw_body, call.body.as_ref())?;
    assertions::assert_no_full_text_echo(
        request,
        &call.raw_body,
        call.body.as_ref(),
        EchoPolicy::ExactSubstring,
    )
}

/// Calls once and requires a contract-valid HTTP 200 without echoed PHI.
async fn classified(
    context: &CaseContext<'_>,
    request: &InferenceRequest,
    recorder: &mut CaseRecorder,
) -> Result<(ModelCall, InferenceResponse), CaseFailure> {
    let payload = RequestPayload::from(request.clone());
    let call = recorder.call(context.client, payload.to_json()).await?;
    assertions::assert_status(call.status, &[200])?;
    let body = call
        .body
        .as_ref()
        .ok_or_else(|| ContractError::Schema("HTTP 200 body is not JSON".to_string()))?;
    let response = assertions::assert_response_contract(body)?;
    check_privacy(&payload, &call)?;
    Ok((call, response))
}

/// Compares every variant with the canonical response.
async fn run_variants(
    context: &CaseContext<'_>,
    group: &VariantGroup,
    recorder: &mut CaseRecorder,
) -> Result<String, CaseFailure> {
    let (_, canonical) = classified(context, &group.canonical, recorder).await?;
    let mut rejected = Vec::new();
    for variant in &group.variants {
        let payload = RequestPayload::from(variant.request.clone());
        let call = recorder.call(context.client, payload.to_json()).await?;
        if group.allow_rejection && call.status == 422 {
            rejected.push(variant.label);
            continue;
        }
        let judged = judge_variant(&payload, &call, &canonical, group);
        judged.map_err(|source| CaseFailure::Variant {
            label: variant.label,
            source,
        })?;
    }
    let compared = group.variants.len() - rejected.len();
    if rejected.is_empty() {
        Ok(format!("{compared} variants consistent with canonical"))
    } else {
        Ok(format!(
            "{compared} variants consistent with canonical; rejected with 422: {}",
            rejected.join(", ")
        ))
    }
}

/// Applies the contract and stability policy to one variant exchange.
fn judge_variant(
    payload: &RequestPayload,
    call: &ModelCall,
    canonical: &InferenceResponse,
    group: &VariantGroup,
) -> Result<(), ContractError> {
    assertions::assert_status(call.status, &[200])?;
    let body = call
        .body
        .as_ref()
        .ok_or_else(|| ContractError::Schema("HTTP 200 body is not JSON".to_string()))?;
    let response = assertions::assert_response_contract(body)?;
    check_privacy(payload, call)?;
    group.policy.compare(canonical, &response)
}

/// Requires confidence to be non-decreasing along the severity series.
async fn run_gradient(
    context: &CaseContext<'_>,
    series: &SeveritySeries,
    recorder: &mut CaseRecorder,
) -> Result<String, CaseFailure> {
    let mut confidences = Vec::with_capacity(series.steps.len());
    for step in &series.steps {
        let (_, response) = classified(context, step, recorder).await?;
        confidences.push(response.confidence);
    }
    assertions::assert_confidence_non_decreasing(&confidences, series.tolerance)?;
    let rendered: Vec<String> = confidences.iter().map(|value| format!("{value:.3}")).collect();
    Ok(format!("confidence gradient [{}]", rendered.join(" <= ")))
}

/// Issues the same request twice and requires the same class.
async fn run_idempotence(
    context: &CaseContext<'_>,
    request: &InferenceRequest,
    recorder: &mut CaseRecorder,
) -> Result<String, CaseFailure> {
    let (_, first) = classified(context, request, recorder).await?;
    let (_, second) = classified(context, request, recorder).await?;
    assertions::assert_same_class(&first, &second)?;
    Ok(format!("class {} on both calls", first.class.as_deref().unwrap_or("null")))
}

// ============================================================================
// SECTION: Performance Cases
// ============================================================================

/// Runs sustained windows; every window must meet the SLA and none may degrade.
async fn run_sustained(
    context: &CaseContext<'_>,
    case: &TestCase,
    windows: usize,
    requests_per_window: usize,
    concurrency: usize,
    recorder: &mut CaseRecorder,
) -> Result<String, CaseFailure> {
    let workload = Workload::varied(requests_per_window);
    let report = riskprobe_load::run_sustained(
        context.client,
        &workload,
        windows,
        requests_per_window,
        concurrency,
    )
    .await?;
    for (index, window) in report.windows.iter().enumerate() {
        recorder.benchmarks.insert(format!("{}_window_{index}", case.name), window.clone());
    }
    let performance = &context.config.performance;
    let mut breaches = Vec::new();
    for (index, window) in report.windows.iter().enumerate() {
        if let Err(violation) = riskprobe_load::assert_sla(window, &performance.sla) {
            breaches.extend(violation.breaches.into_iter().map(|mut breach| {
                breach.window = Some(index);
                breach
            }));
        }
    }
    if let Err(violation) = riskprobe_load::assert_no_degradation(
        &report.windows,
        performance.degradation_ratio,
        performance.degradation_slack_ms,
    ) {
        breaches.extend(violation.breaches);
    }
    if !breaches.is_empty() {
        return Err(SlaViolation {
            breaches,
        }
        .into());
    }
    let p95s: Vec<String> =
        report.windows.iter().map(|window| format!("{:.1}", window.p95_ms)).collect();
    Ok(format!("{} windows stable; p95 ms [{}]", report.windows.len(), p95s.join(", ")))
}

/// Sweeps concurrency levels and requires at least one healthy level.
async fn run_capacity(
    context: &CaseContext<'_>,
    case: &TestCase,
    levels: &[usize],
    requests_per_level: usize,
    recorder: &mut CaseRecorder,
) -> Result<String, CaseFailure> {
    let workload = Workload::varied(requests_per_level);
    let report =
        riskprobe_load::run_capacity_sweep(context.client, &workload, levels, requests_per_level)
            .await?;
    for level in &report.levels {
        recorder
            .benchmarks
            .insert(format!("{}_c{}", case.name, level.concurrency), level.stats.clone());
    }
    let optimal = report
        .optimal_concurrency
        .and_then(|optimal| report.levels.iter().find(|level| level.concurrency == optimal))
        .ok_or(CaseFailure::NoHealthyCapacity)?;
    Ok(format!(
        "optimal concurrency {} at {:.1} req/s",
        optimal.concurrency, optimal.stats.throughput_rps
    ))
}

// ============================================================================
// SECTION: Details
// ============================================================================

/// Summarizes one exchange for a passing outcome.
fn describe_call(call: &ModelCall, response: Option<&InferenceResponse>) -> String {
    match response {
        Some(response) => format!(
            "HTTP {} class={} confidence={:.3}",
            call.status,
            response.class.as_deref().unwrap_or("null"),
            response.confidence
        ),
        None => format!("HTTP {}", call.status),
    }
}

/// Summarizes benchmark statistics for a passing outcome.
fn describe_stats(stats: &LatencyStats) -> String {
    format!(
        "{} calls, success {:.1}%, avg {:.1} ms, p95 {:.1} ms, {:.1} req/s",
        stats.total,
        stats.success_rate * 100.0,
        stats.avg_ms,
        stats.p95_ms,
        stats.throughput_rps
    )
}
