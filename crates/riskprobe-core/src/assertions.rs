// crates/riskprobe-core/src/assertions.rs
// ============================================================================
// Module: Contract Assertions
// Description: Pure predicates over inference responses.
// Purpose: Decide pass/fail for schema, label, PHI, explainability, confidence.
// Dependencies: jsonschema, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every assertion is side-effect free and returns `Ok` or a
//! [`ContractError`] naming the violated field and value. Test cases compose
//! assertions by chaining them with `?`; the first violation is terminal.
//!
//! Schema checking runs in two passes: a presence pass that names the first
//! missing required field, then a JSON Schema (draft 2020-12) pass over types
//! and ranges. Only a body that survives both is decoded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::OnceLock;

use jsonschema::Draft;
use jsonschema::Validator;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::model::InferenceResponse;
use crate::model::RequestPayload;
use crate::model::RiskLabel;
use crate::phi;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Fields that must be present on every HTTP 200 body.
pub const REQUIRED_RESPONSE_FIELDS: [&str; 4] =
    ["class", "confidence", "explanations", "model_version"];

/// Complaints shorter than this are exempt from full-text echo checks; they
/// collide with legitimate feature names.
const MIN_ECHO_CHARS: usize = 20;

/// Default clinical vocabulary for explanation feature names.
const DEFAULT_FEATURE_TERMS: &[&str] = &[
    "age", "arrhythm", "bp", "breath", "cardiac", "chest", "comorbid", "crushing",
    "diabet", "diastolic", "discomfort", "dizz", "domain_mismatch", "dyspnea", "exert",
    "heart", "hr", "hypertens", "low_signal", "nausea", "onset", "out_of_distribution",
    "pain", "palpitation", "pressure", "pulse", "radiat", "sex", "smok", "spo2", "stairs",
    "sweat", "syncope", "systolic", "temp", "tightness", "vital",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Contract assertion failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Missing or mistyped field, or out-of-range confidence.
    #[error("schema error: {0}")]
    Schema(String),
    /// Label outside the whitelist, missing explanations, or similar breach.
    #[error("contract violation: {0}")]
    ContractViolation(String),
    /// Sensitive request content found in the response.
    #[error("PHI leak: {0}")]
    PhiLeak(String),
    /// Response does not match the scenario's expected qualitative outcome.
    #[error("expectation not met: {0}")]
    Expectation(String),
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// JSON Schema for a successful inference body.
fn response_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": REQUIRED_RESPONSE_FIELDS,
        "properties": {
            "class": { "type": ["string", "null"] },
            "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
            "explanations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["feature"],
                    "properties": {
                        "feature": { "type": "string" },
                        "weight": { "type": ["number", "null"] }
                    }
                }
            },
            "warnings": { "type": "array", "items": { "type": "string" } },
            "model_version": { "type": "string", "minLength": 1 }
        }
    })
}

/// Returns the compiled response schema, built once per process.
fn response_validator() -> Result<&'static Validator, ContractError> {
    static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();
    VALIDATOR
        .get_or_init(|| {
            jsonschema::options()
                .with_draft(Draft::Draft202012)
                .build(&response_schema())
                .map_err(|err| err.to_string())
        })
        .as_ref()
        .map_err(|err| ContractError::Schema(format!("response schema unavailable: {err}")))
}

/// Checks required fields, primitive types, and `confidence` range, then decodes.
///
/// # Errors
///
/// Returns [`ContractError::Schema`] naming the first missing field or listing
/// every type/range violation.
pub fn assert_schema_valid(body: &Value) -> Result<InferenceResponse, ContractError> {
    let Some(object) = body.as_object() else {
        return Err(ContractError::Schema(format!(
            "response body is not a JSON object: {}",
            json_kind(body)
        )));
    };
    if let Some(missing) = REQUIRED_RESPONSE_FIELDS.iter().find(|field| !object.contains_key(**field))
    {
        return Err(ContractError::Schema(format!("missing required field `{missing}`")));
    }
    let validator = response_validator()?;
    let messages: Vec<String> = validator.iter_errors(body).map(|err| err.to_string()).collect();
    if !messages.is_empty() {
        return Err(ContractError::Schema(messages.join("; ")));
    }
    serde_json::from_value(body.clone())
        .map_err(|err| ContractError::Schema(format!("response decode failed: {err}")))
}

/// Names the JSON type of a value.
const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Fails unless `class` is `null` or one of the whitelisted labels.
///
/// # Errors
///
/// Returns [`ContractError::ContractViolation`] with the off-contract label.
pub fn assert_label_whitelisted(
    response: &InferenceResponse,
) -> Result<Option<RiskLabel>, ContractError> {
    response.label().map_err(|raw| {
        ContractError::ContractViolation(format!(
            "class `{raw}` is outside the label whitelist {{urgent, elevated_risk, needs_review, null}}"
        ))
    })
}

/// Fails unless the (whitelisted) label is one of `allowed`; `None` means `null`.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] when the label is not allowed.
pub fn assert_label_in(
    response: &InferenceResponse,
    allowed: &[Option<RiskLabel>],
) -> Result<(), ContractError> {
    let label = assert_label_whitelisted(response)?;
    if allowed.contains(&label) {
        return Ok(());
    }
    let expected: Vec<&str> = allowed.iter().map(|label| label_name(*label)).collect();
    Err(ContractError::Expectation(format!(
        "class `{}` not in expected set [{}]",
        label_name(label),
        expected.join(", ")
    )))
}

/// Runs the schema, whitelist, and classified-implies-explained checks together.
///
/// # Errors
///
/// Returns the first violated contract check.
pub fn assert_response_contract(body: &Value) -> Result<InferenceResponse, ContractError> {
    let response = assert_schema_valid(body)?;
    let label = assert_label_whitelisted(&response)?;
    if label.is_some() && response.explanations.is_empty() {
        return Err(ContractError::ContractViolation(format!(
            "class `{}` returned with empty explanations",
            label_name(label)
        )));
    }
    Ok(response)
}

/// Renders a label, using `null` for `None`.
fn label_name(label: Option<RiskLabel>) -> &'static str {
    label.map_or("null", RiskLabel::as_str)
}

// ============================================================================
// SECTION: PHI
// ============================================================================

/// Fails if any patient identifier, name token, or phone number from the
/// request appears in the serialized response.
///
/// # Errors
///
/// Returns [`ContractError::PhiLeak`] with masked tokens, or
/// [`ContractError::ContractViolation`] if the detector cannot run.
pub fn assert_no_phi_echo(
    request: &RequestPayload,
    raw_body: &str,
    body: Option<&Value>,
) -> Result<(), ContractError> {
    let tokens = phi::scan_request(request).map_err(|err| {
        ContractError::ContractViolation(format!("PHI detector unavailable: {err}"))
    })?;
    let haystack = phi::response_haystack(raw_body, body);
    let leaked = phi::echoed_tokens(&tokens, &haystack);
    if leaked.is_empty() {
        return Ok(());
    }
    let described: Vec<String> =
        leaked.iter().map(|token| format!("{} {}", token.kind, phi::mask(&token.value))).collect();
    Err(ContractError::PhiLeak(format!("response echoes {}", described.join(", "))))
}

/// Full-text echo policy for `chief_complaint`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EchoPolicy {
    /// Fail on a case-insensitive contiguous substring match.
    ExactSubstring,
    /// Fail when more than `max_ratio` of significant words reappear.
    WordOverlap {
        /// Words shorter than this are ignored.
        min_word_chars: usize,
        /// Largest tolerated fraction of significant words.
        max_ratio: f64,
    },
}

impl EchoPolicy {
    /// Word-overlap policy: words over five characters, fail above half.
    pub const DEFAULT_OVERLAP: Self = Self::WordOverlap {
        min_word_chars: 6,
        max_ratio: 0.5,
    };
}

/// Fails if the response contains the request's chief complaint.
///
/// # Errors
///
/// Returns [`ContractError::PhiLeak`] describing the echo without repeating it.
pub fn assert_no_full_text_echo(
    request: &RequestPayload,
    raw_body: &str,
    body: Option<&Value>,
    policy: EchoPolicy,
) -> Result<(), ContractError> {
    let Some(complaint) = request.chief_complaint() else {
        return Ok(());
    };
    let complaint = complaint.trim().to_lowercase();
    if complaint.chars().count() < MIN_ECHO_CHARS {
        return Ok(());
    }
    let haystack = phi::response_haystack(raw_body, body);
    match policy {
        EchoPolicy::ExactSubstring => {
            if haystack.full().contains(&complaint) {
                return Err(ContractError::PhiLeak(format!(
                    "response echoes the full chief_complaint {}",
                    phi::mask(&complaint)
                )));
            }
        }
        EchoPolicy::WordOverlap {
            min_word_chars,
            max_ratio,
        } => {
            let words: BTreeSet<&str> = complaint
                .split(|ch: char| !ch.is_alphanumeric())
                .filter(|word| word.chars().count() >= min_word_chars)
                .collect();
            if words.is_empty() {
                return Ok(());
            }
            let echoed = words.iter().filter(|word| haystack.full().contains(**word)).count();
            #[allow(clippy::cast_precision_loss, reason = "word counts are small")]
            let ratio = echoed as f64 / words.len() as f64;
            if ratio > max_ratio {
                return Err(ContractError::PhiLeak(format!(
                    "response echoes {echoed}/{} significant chief_complaint words",
                    words.len()
                )));
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Explanations
// ============================================================================

/// Clinical vocabulary used to judge explanation feature names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureVocabulary {
    /// Lowercase fragments; a feature is known when it contains any of them.
    terms: Vec<String>,
}

impl FeatureVocabulary {
    /// Builds a vocabulary from custom fragments.
    #[must_use]
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms.into_iter().map(|term| term.as_ref().to_lowercase()).collect(),
        }
    }

    /// Returns true when the feature name contains a known clinical fragment.
    #[must_use]
    pub fn is_known(&self, feature: &str) -> bool {
        let lowered = feature.to_lowercase();
        !lowered.trim().is_empty() && self.terms.iter().any(|term| lowered.contains(term.as_str()))
    }
}

impl Default for FeatureVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_TERMS)
    }
}

/// Fails unless explanations are non-empty, named from the vocabulary, and weighted.
///
/// # Errors
///
/// Returns [`ContractError::ContractViolation`] naming the offending entry.
pub fn assert_explanations_present(
    response: &InferenceResponse,
    vocabulary: &FeatureVocabulary,
) -> Result<(), ContractError> {
    if response.explanations.is_empty() {
        return Err(ContractError::ContractViolation("explanations is empty".to_string()));
    }
    for (index, entry) in response.explanations.iter().enumerate() {
        if !vocabulary.is_known(&entry.feature) {
            return Err(ContractError::ContractViolation(format!(
                "explanations[{index}].feature `{}` is not a known clinical feature",
                entry.feature
            )));
        }
        match entry.weight {
            Some(weight) if weight.is_finite() => {}
            _ => {
                return Err(ContractError::ContractViolation(format!(
                    "explanations[{index}].weight is not numeric"
                )));
            }
        }
    }
    Ok(())
}

/// Fails unless some explanation feature mentions one of `terms`.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] listing the features seen.
pub fn assert_features_mention(
    response: &InferenceResponse,
    terms: &[&str],
) -> Result<(), ContractError> {
    if terms.is_empty() {
        return Ok(());
    }
    let hit = response.explanations.iter().any(|entry| {
        let lowered = entry.feature.to_lowercase();
        terms.iter().any(|term| lowered.contains(&term.to_lowercase()))
    });
    if hit {
        return Ok(());
    }
    let seen: Vec<&str> = response.explanations.iter().map(|entry| entry.feature.as_str()).collect();
    Err(ContractError::Expectation(format!(
        "no explanation feature mentions any of [{}]; features were [{}]",
        terms.join(", "),
        seen.join(", ")
    )))
}

// ============================================================================
// SECTION: Warnings and Status
// ============================================================================

/// Fails unless some warning contains one of `terms` (case-insensitive).
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] listing the warnings seen.
pub fn assert_warning_mentions(
    response: &InferenceResponse,
    terms: &[&str],
) -> Result<(), ContractError> {
    let hit = response.warnings.iter().any(|warning| {
        let lowered = warning.to_lowercase();
        terms.iter().any(|term| lowered.contains(&term.to_lowercase()))
    });
    if hit {
        Ok(())
    } else {
        Err(ContractError::Expectation(format!(
            "no warning mentions any of [{}]; warnings were [{}]",
            terms.join(", "),
            response.warnings.join(" | ")
        )))
    }
}

/// Fails unless `status` is one of `allowed`.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] naming the status.
pub fn assert_status(status: u16, allowed: &[u16]) -> Result<(), ContractError> {
    if allowed.contains(&status) {
        Ok(())
    } else {
        let allowed: Vec<String> = allowed.iter().map(u16::to_string).collect();
        Err(ContractError::Expectation(format!(
            "HTTP status {status} not in [{}]",
            allowed.join(", ")
        )))
    }
}

// ============================================================================
// SECTION: Confidence
// ============================================================================

/// Fails if a classified response (non-null, not `needs_review`) is below `floor`.
///
/// # Errors
///
/// Returns [`ContractError::ContractViolation`] with the observed confidence.
pub fn assert_confidence_floor(
    response: &InferenceResponse,
    floor: f64,
) -> Result<(), ContractError> {
    match assert_label_whitelisted(response)? {
        None | Some(RiskLabel::NeedsReview) => Ok(()),
        Some(label) if response.confidence < floor => Err(ContractError::ContractViolation(
            format!("class `{label}` reported confidence {} below floor {floor}", response.confidence),
        )),
        Some(_) => Ok(()),
    }
}

/// Fails unless `min <= confidence <= max`.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] with the observed confidence.
pub fn assert_confidence_between(
    response: &InferenceResponse,
    min: f64,
    max: f64,
) -> Result<(), ContractError> {
    if (min..=max).contains(&response.confidence) {
        Ok(())
    } else {
        Err(ContractError::Expectation(format!(
            "confidence {} outside [{min}, {max}]",
            response.confidence
        )))
    }
}

/// Fails unless the variant's confidence is within `tolerance` of the canonical one.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] with both confidences.
pub fn assert_confidence_within(
    canonical: &InferenceResponse,
    variant: &InferenceResponse,
    tolerance: f64,
) -> Result<(), ContractError> {
    let delta = (canonical.confidence - variant.confidence).abs();
    if delta <= tolerance {
        Ok(())
    } else {
        Err(ContractError::Expectation(format!(
            "confidence {} drifted {delta:.3} from canonical {} (tolerance {tolerance})",
            variant.confidence, canonical.confidence
        )))
    }
}

/// Fails unless confidences are non-decreasing within `tolerance`.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] naming the first inversion.
pub fn assert_confidence_non_decreasing(
    confidences: &[f64],
    tolerance: f64,
) -> Result<(), ContractError> {
    for (index, pair) in confidences.windows(2).enumerate() {
        if pair[0] > pair[1] + tolerance {
            return Err(ContractError::Expectation(format!(
                "confidence fell from {} at step {index} to {} at step {} (tolerance {tolerance})",
                pair[0],
                pair[1],
                index + 1
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Stability
// ============================================================================

/// Fails unless the two labels are equal or one severity step apart.
///
/// `null` is adjacent only to `null`.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] with both labels, or a whitelist violation.
pub fn assert_labels_adjacent(
    canonical: &InferenceResponse,
    variant: &InferenceResponse,
) -> Result<(), ContractError> {
    let left = assert_label_whitelisted(canonical)?;
    let right = assert_label_whitelisted(variant)?;
    let adjacent = match (left, right) {
        (None, None) => true,
        (Some(a), Some(b)) => a.severity().abs_diff(b.severity()) <= 1,
        _ => false,
    };
    if adjacent {
        Ok(())
    } else {
        Err(ContractError::Expectation(format!(
            "class `{}` is not adjacent to canonical `{}`",
            label_name(right),
            label_name(left)
        )))
    }
}

/// Fails unless both responses carry the same class.
///
/// # Errors
///
/// Returns [`ContractError::Expectation`] with both classes.
pub fn assert_same_class(
    first: &InferenceResponse,
    second: &InferenceResponse,
) -> Result<(), ContractError> {
    if first.class == second.class {
        Ok(())
    } else {
        Err(ContractError::Expectation(format!(
            "class changed between identical requests: `{}` then `{}`",
            first.class.as_deref().unwrap_or("null"),
            second.class.as_deref().unwrap_or("null")
        )))
    }
}
