// crates/riskprobe-mock/src/classifier.rs
// ============================================================================
// Module: Mock Classifier
// Description: Deterministic request validation and keyword classification.
// Purpose: Give the harness a stable oracle that honors the wire contract.
// Dependencies: riskprobe-core, serde_json
// ============================================================================

//! ## Overview
//! Maps a raw request body to a fixed `(status, body)` reply. Validation
//! failures produce HTTP 422 with a `detail` list naming each bad field;
//! valid requests are classified by age bounds, domain hint, and complaint
//! keywords. [`MockMode`] injects contract defects for negative testing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use riskprobe_core::InferenceRequest;
use riskprobe_core::RiskLabel;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version string reported by the mock model.
pub const MOCK_MODEL_VERSION: &str = "mock-riskprobe-1.0";
/// Youngest age the adult-only model supports.
pub const ADULT_MIN_AGE: i64 = 18;
/// Accepted age range.
const AGE_RANGE: std::ops::RangeInclusive<i64> = 0..=120;
/// Label reported in off-contract mode.
pub const OFF_CONTRACT_LABEL: &str = "low_risk";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Contract behavior of the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockMode {
    /// Honors every contract rule.
    #[default]
    Compliant,
    /// Copies the chief complaint into `warnings` (PHI leak).
    EchoComplaint,
    /// Reports a label outside the whitelist for classified requests.
    OffContractLabel,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name (`body` for whole-body errors).
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable error type.
    pub kind: &'static str,
}

impl FieldError {
    /// Builds a field error.
    fn new(field: &str, message: &str, kind: &'static str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            kind,
        }
    }

    /// Renders the error in the `detail[]` shape.
    fn to_json(&self) -> Value {
        let loc = if self.field == "body" { json!(["body"]) } else { json!(["body", self.field]) };
        json!({ "loc": loc, "msg": self.message, "type": self.kind })
    }
}

/// Reply produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct MockReply {
    /// HTTP status.
    pub status: u16,
    /// JSON body.
    pub body: Value,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a raw request body and decodes it.
///
/// # Errors
///
/// Returns every field-level failure found.
pub fn validate_request(body: &Value) -> Result<InferenceRequest, Vec<FieldError>> {
    let Some(object) = body.as_object() else {
        return Err(vec![FieldError::new("body", "request body must be a JSON object", "dict_type")]);
    };
    let mut errors = Vec::new();
    match object.get("patient_id") {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("patient_id", "field required", "missing"));
        }
        Some(Value::String(id)) if id.is_empty() => errors.push(FieldError::new(
            "patient_id",
            "string should have at least 1 character",
            "string_too_short",
        )),
        Some(Value::String(_)) => {}
        Some(_) => errors.push(FieldError::new("patient_id", "input should be a string", "string_type")),
    }
    match object.get("age") {
        None | Some(Value::Null) => {}
        Some(value) => match value.as_i64() {
            Some(age) if AGE_RANGE.contains(&age) => {}
            Some(_) => errors.push(FieldError::new(
                "age",
                "input should be between 0 and 120",
                "less_than_equal",
            )),
            None => errors.push(FieldError::new(
                "age",
                "input should be a valid integer",
                "int_parsing",
            )),
        },
    }
    for field in ["sex", "chief_complaint", "onset_date", "language", "domain_hint"] {
        optional_string(object, field, &mut errors);
    }
    for field in ["comorbidities", "meds"] {
        optional_string_list(object, field, &mut errors);
    }
    match object.get("vitals") {
        None | Some(Value::Null) => {}
        Some(Value::Object(vitals)) => {
            if vitals.values().any(|value| !value.is_number()) {
                errors.push(FieldError::new(
                    "vitals",
                    "vital values should be numbers",
                    "float_parsing",
                ));
            }
        }
        Some(_) => errors.push(FieldError::new("vitals", "input should be an object", "dict_type")),
    }
    if !errors.is_empty() {
        return Err(errors);
    }
    serde_json::from_value(body.clone())
        .map_err(|err| vec![FieldError::new("body", &err.to_string(), "value_error")])
}

/// Records an error unless the field is absent, null, or a string.
fn optional_string(object: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) {
    if let Some(value) = object.get(field) {
        if !(value.is_null() || value.is_string()) {
            errors.push(FieldError::new(field, "input should be a string", "string_type"));
        }
    }
}

/// Records an error unless the field is absent, null, or a list of strings.
fn optional_string_list(object: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) {
    match object.get(field) {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
        Some(_) => errors.push(FieldError::new(field, "input should be a list of strings", "list_type")),
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Builds the success body for one label.
fn success_body(
    class: &str,
    confidence: f64,
    explanations: &[(&str, f64)],
    warnings: &[String],
) -> Value {
    let explanations: Vec<Value> = explanations
        .iter()
        .map(|(feature, weight)| json!({ "feature": feature, "weight": weight }))
        .collect();
    json!({
        "class": class,
        "confidence": confidence,
        "explanations": explanations,
        "warnings": warnings,
        "model_version": MOCK_MODEL_VERSION,
    })
}

/// Classifies a validated request.
#[must_use]
pub fn classify(request: &InferenceRequest) -> Value {
    let complaint = request.chief_complaint.as_deref().unwrap_or_default().to_lowercase();
    let pediatric_age = request.age.is_some_and(|age| age < ADULT_MIN_AGE);
    let pediatric_domain = request
        .domain_hint
        .as_deref()
        .is_some_and(|hint| hint.to_lowercase().contains("pediatric"));
    if pediatric_age || pediatric_domain {
        let reason = if pediatric_age {
            "out-of-distribution: pediatric patient outside adult model scope"
        } else {
            "out-of-distribution: unsupported domain"
        };
        return success_body(
            RiskLabel::NeedsReview.as_str(),
            0.4,
            &[("domain_mismatch", 0.1)],
            &[reason.to_string(), "needs review".to_string()],
        );
    }
    if complaint.contains("crushing chest pain") {
        return success_body(
            RiskLabel::Urgent.as_str(),
            0.95,
            &[("crushing chest pain", 0.9)],
            &["urgent escalation".to_string()],
        );
    }
    if complaint.contains("chest") || complaint.contains("exert") {
        let exertional = ["exert", "stairs", "walking", "climb"]
            .iter()
            .any(|term| complaint.contains(term));
        let explanations: &[(&str, f64)] = if exertional {
            &[("chest", 0.6), ("exertional_pattern", 0.3)]
        } else {
            &[("chest", 0.6)]
        };
        return success_body(RiskLabel::ElevatedRisk.as_str(), 0.82, explanations, &[]);
    }
    success_body(
        RiskLabel::NeedsReview.as_str(),
        0.45,
        &[("low_signal", 0.1)],
        &["low confidence - needs review".to_string()],
    )
}

/// Produces the full reply for a raw request body under `mode`.
#[must_use]
pub fn respond(body: &Value, mode: MockMode) -> MockReply {
    let request = match validate_request(body) {
        Ok(request) => request,
        Err(errors) => {
            let detail: Vec<Value> = errors.iter().map(FieldError::to_json).collect();
            return MockReply {
                status: 422,
                body: json!({ "detail": detail }),
            };
        }
    };
    let mut reply = classify(&request);
    match mode {
        MockMode::Compliant => {}
        MockMode::EchoComplaint => {
            if let (Some(complaint), Some(Value::Array(warnings))) =
                (request.chief_complaint.as_deref(), reply.get_mut("warnings"))
            {
                warnings.push(Value::String(format!("noted: {complaint}")));
            }
        }
        MockMode::OffContractLabel => {
            if reply.get("class").and_then(Value::as_str) != Some(RiskLabel::NeedsReview.as_str()) {
                reply["class"] = json!(OFF_CONTRACT_LABEL);
            }
        }
    }
    MockReply {
        status: 200,
        body: reply,
    }
}
