// crates/riskprobe-core/src/model.rs
// ============================================================================
// Module: Inference Wire Model
// Description: Request and response shapes for the risk-classification API.
// Purpose: Provide typed, serializable payloads with stable wire forms.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Typed request/response model for `POST {MODEL_URL}{MODEL_INFER_PATH}`.
//! Requests are either well-formed ([`InferenceRequest`]) or deliberately
//! malformed raw JSON used by negative scenarios. Responses keep the `class`
//! field as a raw string so off-contract labels survive decoding and can be
//! reported by the whitelist assertion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Closed set of non-null classification labels.
///
/// # Invariants
/// - Together with `null` this is the complete label whitelist; responses
///   never extend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    /// Ambiguous or out-of-scope input deferred to a clinician.
    NeedsReview,
    /// Concerning presentation needing prompt evaluation.
    ElevatedRisk,
    /// Acute presentation requiring immediate escalation.
    Urgent,
}

impl RiskLabel {
    /// All whitelisted non-null labels in ascending severity.
    pub const ALL: [Self; 3] = [Self::NeedsReview, Self::ElevatedRisk, Self::Urgent];

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NeedsReview => "needs_review",
            Self::ElevatedRisk => "elevated_risk",
            Self::Urgent => "urgent",
        }
    }

    /// Parses a wire label; returns `None` for anything outside the whitelist.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == raw)
    }

    /// Ordinal severity used for adjacency checks (`needs_review` = 0).
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::NeedsReview => 0,
            Self::ElevatedRisk => 1,
            Self::Urgent => 2,
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Well-formed inference request.
///
/// # Invariants
/// - `patient_id` is an opaque identifier; it is never interpreted.
/// - `sex` always serializes (as `null` when absent) so the null-category
///   variant is explicit on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Opaque patient identifier.
    pub patient_id: String,
    /// Age in years. Signed so out-of-domain boundary probes are expressible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    /// Sex/gender in any accepted external representation.
    #[serde(default)]
    pub sex: Option<String>,
    /// Free-text presenting complaint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chief_complaint: Option<String>,
    /// Vital signs keyed by metric name (`bp_systolic`, `hr`, `spo2`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitals: Option<BTreeMap<String, f64>>,
    /// Symptom onset in any external date representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onset_date: Option<String>,
    /// Known comorbidities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comorbidities: Option<Vec<String>>,
    /// Current medications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meds: Option<Vec<String>>,
    /// Language tag of the complaint text (e.g. `hi-en`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Clinical domain hint (e.g. `pediatric_oncology`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_hint: Option<String>,
}

impl InferenceRequest {
    /// Creates a request carrying only a patient identifier.
    #[must_use]
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            age: None,
            sex: None,
            chief_complaint: None,
            vitals: None,
            onset_date: None,
            comorbidities: None,
            meds: None,
            language: None,
            domain_hint: None,
        }
    }

    /// Sets the age.
    #[must_use]
    pub const fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    /// Sets the sex/gender value.
    #[must_use]
    pub fn with_sex(mut self, sex: impl Into<String>) -> Self {
        self.sex = Some(sex.into());
        self
    }

    /// Sets the chief complaint text.
    #[must_use]
    pub fn with_complaint(mut self, complaint: impl Into<String>) -> Self {
        self.chief_complaint = Some(complaint.into());
        self
    }

    /// Adds one vital sign.
    #[must_use]
    pub fn with_vital(mut self, metric: &str, value: f64) -> Self {
        self.vitals.get_or_insert_with(BTreeMap::new).insert(metric.to_string(), value);
        self
    }

    /// Sets the onset date string.
    #[must_use]
    pub fn with_onset_date(mut self, onset: impl Into<String>) -> Self {
        self.onset_date = Some(onset.into());
        self
    }

    /// Sets the language tag.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the domain hint.
    #[must_use]
    pub fn with_domain_hint(mut self, hint: impl Into<String>) -> Self {
        self.domain_hint = Some(hint.into());
        self
    }

    /// Sets comorbidities.
    #[must_use]
    pub fn with_comorbidities(mut self, items: &[&str]) -> Self {
        self.comorbidities = Some(items.iter().map(|item| (*item).to_string()).collect());
        self
    }

    /// Sets medications.
    #[must_use]
    pub fn with_meds(mut self, items: &[&str]) -> Self {
        self.meds = Some(items.iter().map(|item| (*item).to_string()).collect());
        self
    }
}

/// Payload sent to the inference endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    /// Typed, contract-conforming request.
    Wellformed(InferenceRequest),
    /// Deliberately malformed body (wrong types, missing fields).
    Malformed(Value),
}

impl RequestPayload {
    /// Returns the JSON body to send on the wire.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Wellformed(request) => serde_json::to_value(request).unwrap_or(Value::Null),
            Self::Malformed(value) => value.clone(),
        }
    }

    /// Returns the typed request when the payload is well-formed.
    #[must_use]
    pub const fn as_request(&self) -> Option<&InferenceRequest> {
        match self {
            Self::Wellformed(request) => Some(request),
            Self::Malformed(_) => None,
        }
    }

    /// Returns the patient identifier when one is present as a string.
    #[must_use]
    pub fn patient_id(&self) -> Option<&str> {
        match self {
            Self::Wellformed(request) => Some(request.patient_id.as_str()),
            Self::Malformed(value) => value.get("patient_id").and_then(Value::as_str),
        }
    }

    /// Returns the chief complaint when one is present as a string.
    #[must_use]
    pub fn chief_complaint(&self) -> Option<&str> {
        match self {
            Self::Wellformed(request) => request.chief_complaint.as_deref(),
            Self::Malformed(value) => value.get("chief_complaint").and_then(Value::as_str),
        }
    }
}

impl From<InferenceRequest> for RequestPayload {
    fn from(request: InferenceRequest) -> Self {
        Self::Wellformed(request)
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Single feature attribution in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Clinical feature name.
    pub feature: String,
    /// Attribution weight; `null` on the wire decodes to `None`.
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Successful inference response.
///
/// # Invariants
/// - Decoding does not prove presence of required fields; run
///   `assertions::assert_schema_valid` on the raw body first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Raw classification label (`None` for JSON `null`).
    pub class: Option<String>,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
    /// Ordered feature attributions.
    pub explanations: Vec<Explanation>,
    /// Free-text warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Model version string.
    pub model_version: String,
}

impl InferenceResponse {
    /// Returns the whitelisted label, or `Err(raw)` for an off-contract label.
    ///
    /// # Errors
    ///
    /// Returns the raw label string when it is outside the whitelist.
    pub fn label(&self) -> Result<Option<RiskLabel>, &str> {
        match self.class.as_deref() {
            None => Ok(None),
            Some(raw) => RiskLabel::parse(raw).map(Some).ok_or(raw),
        }
    }
}
