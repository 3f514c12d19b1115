// crates/riskprobe-core/src/scenarios.rs
// ============================================================================
// Module: Scenario Generators
// Description: Deterministic request variants tagged with expected outcomes.
// Purpose: Exercise safety, robustness, format, and gradient axes of the API.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Generators are pure: calling one twice yields identical requests. Each
//! single-request [`Scenario`] carries an [`Expectation`] that
//! [`Expectation::verify`] turns into a pass/fail verdict. Stability axes
//! (language, dates, sex, units) are expressed as a [`VariantGroup`] compared
//! against a canonical request, and the severity axis as a [`SeveritySeries`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::assertions;
use crate::assertions::ContractError;
use crate::assertions::FeatureVocabulary;
use crate::model::InferenceRequest;
use crate::model::InferenceResponse;
use crate::model::RequestPayload;
use crate::model::RiskLabel;
use crate::outcome::Priority;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Complaint used by the canonical well-formed request.
pub const CANONICAL_COMPLAINT: &str = "Exertional chest discomfort for 2 weeks, worse on stairs";
/// Terms an out-of-distribution warning is expected to mention.
pub const OOD_WARNING_TERMS: &[&str] = &["out-of-distribution", "out of distribution", "pediatric"];
/// Terms a deferral warning may mention.
pub const REVIEW_WARNING_TERMS: &[&str] = &["review", "low confidence", "insufficient"];
/// Target size of the long-narrative complaint in bytes.
pub const LONG_NARRATIVE_BYTES: usize = 50 * 1024;

/// Labels accepted for a low-signal request.
const DEFERRED: &[Option<RiskLabel>] = &[Some(RiskLabel::NeedsReview), None];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Robustness axis a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScenarioCategory {
    /// Adverse symptoms and out-of-distribution subjects.
    SafetyCritical,
    /// PHI-bearing adversarial text.
    Privacy,
    /// Code-mixed language, typos, synonyms, emoji, case.
    LanguageRobustness,
    /// Dates, units, and categorical field representations.
    FormatVariation,
    /// Vague complaints and wrong-typed fields.
    LowSignalInvalid,
    /// Age domain edges.
    Boundary,
    /// Monotonic symptom-severity sequence.
    ConfidenceGradient,
}

/// Expected confidence with an absolute tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBand {
    /// Expected confidence.
    pub target: f64,
    /// Allowed absolute deviation.
    pub tolerance: f64,
}

/// Expected qualitative outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// HTTP 200 with one of `labels`, explained, at or above the floor.
    Classify {
        /// Accepted labels.
        labels: &'static [Option<RiskLabel>],
        /// Optional expected confidence band.
        confidence: Option<ConfidenceBand>,
        /// Explanation features should mention one of these.
        feature_terms: &'static [&'static str],
        /// Require an empty `warnings` list.
        no_warnings: bool,
    },
    /// HTTP 200 with an out-of-distribution warning and confidence below the floor.
    OodWarning {
        /// Warning must mention one of these.
        warning_terms: &'static [&'static str],
    },
    /// HTTP 422, or HTTP 200 deferred to `needs_review`/`null`.
    DeferOrReject,
    /// HTTP 422 validation error.
    Reject,
    /// Any listed status; a 200 body must still honor the contract.
    AcceptOrReject {
        /// Accepted statuses.
        statuses: &'static [u16],
    },
    /// HTTP 200 honoring the contract.
    Accept,
}

impl Expectation {
    /// Checks one exchange against the expectation.
    ///
    /// Returns the decoded response for HTTP 200 outcomes so callers can run
    /// further assertions.
    ///
    /// # Errors
    ///
    /// Returns the first violated contract check or expectation.
    pub fn verify(
        &self,
        status: u16,
        body: Option<&Value>,
        floor: f64,
        vocabulary: &FeatureVocabulary,
    ) -> Result<Option<InferenceResponse>, ContractError> {
        match self {
            Self::Reject => {
                assertions::assert_status(status, &[422])?;
                Ok(None)
            }
            Self::AcceptOrReject {
                statuses,
            } => {
                assertions::assert_status(status, statuses)?;
                if status == 200 { accepted(body).map(Some) } else { Ok(None) }
            }
            Self::Accept => {
                assertions::assert_status(status, &[200])?;
                accepted(body).map(Some)
            }
            Self::DeferOrReject => {
                assertions::assert_status(status, &[200, 422])?;
                if status == 422 {
                    return Ok(None);
                }
                let response = accepted(body)?;
                assertions::assert_label_in(&response, DEFERRED)?;
                Ok(Some(response))
            }
            Self::OodWarning {
                warning_terms,
            } => {
                assertions::assert_status(status, &[200])?;
                let response = accepted(body)?;
                assertions::assert_warning_mentions(&response, warning_terms)?;
                if response.confidence >= floor {
                    return Err(ContractError::Expectation(format!(
                        "out-of-distribution input reported confidence {} at or above floor {floor}",
                        response.confidence
                    )));
                }
                Ok(Some(response))
            }
            Self::Classify {
                labels,
                confidence,
                feature_terms,
                no_warnings,
            } => {
                assertions::assert_status(status, &[200])?;
                let response = accepted(body)?;
                assertions::assert_label_in(&response, labels)?;
                assertions::assert_explanations_present(&response, vocabulary)?;
                assertions::assert_confidence_floor(&response, floor)?;
                if let Some(band) = confidence {
                    assertions::assert_confidence_between(
                        &response,
                        band.target - band.tolerance,
                        band.target + band.tolerance,
                    )?;
                }
                assertions::assert_features_mention(&response, feature_terms)?;
                if *no_warnings && !response.warnings.is_empty() {
                    return Err(ContractError::Expectation(format!(
                        "expected no warnings, got {}",
                        response.warnings.len()
                    )));
                }
                Ok(Some(response))
            }
        }
    }
}

/// Decodes an HTTP 200 body under the full response contract.
fn accepted(body: Option<&Value>) -> Result<InferenceResponse, ContractError> {
    let body = body.ok_or_else(|| ContractError::Schema("HTTP 200 body is not JSON".to_string()))?;
    assertions::assert_response_contract(body)
}

/// One request with its expected outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Stable scenario name.
    pub name: &'static str,
    /// Robustness axis.
    pub category: ScenarioCategory,
    /// Priority tier.
    pub priority: Priority,
    /// Payload to send.
    pub request: RequestPayload,
    /// Expected outcome.
    pub expectation: Expectation,
}

/// How variant responses must relate to the canonical response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StabilityPolicy {
    /// Same or adjacent label, confidence within `tolerance`.
    Adjacent {
        /// Allowed absolute confidence drift.
        tolerance: f64,
    },
    /// Same label, confidence within `tolerance`.
    Equivalent {
        /// Allowed absolute confidence drift.
        tolerance: f64,
    },
}

impl StabilityPolicy {
    /// Compares one variant response with the canonical response.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Expectation`] when the variant drifts too far.
    pub fn compare(
        self,
        canonical: &InferenceResponse,
        variant: &InferenceResponse,
    ) -> Result<(), ContractError> {
        match self {
            Self::Adjacent {
                tolerance,
            } => {
                assertions::assert_labels_adjacent(canonical, variant)?;
                assertions::assert_confidence_within(canonical, variant, tolerance)
            }
            Self::Equivalent {
                tolerance,
            } => {
                assertions::assert_same_class(canonical, variant)?;
                assertions::assert_confidence_within(canonical, variant, tolerance)
            }
        }
    }
}

/// One alternative rendering of the canonical request.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Short label naming the rendering (`typos`, `hinglish`, ...).
    pub label: &'static str,
    /// Variant request.
    pub request: InferenceRequest,
}

/// Canonical request plus variants that must classify consistently with it.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantGroup {
    /// Stable group name.
    pub name: &'static str,
    /// Robustness axis.
    pub category: ScenarioCategory,
    /// Priority tier.
    pub priority: Priority,
    /// Reference rendering.
    pub canonical: InferenceRequest,
    /// Alternative renderings.
    pub variants: Vec<Variant>,
    /// Comparison policy.
    pub policy: StabilityPolicy,
    /// Whether a variant may be rejected with 422 instead of classified.
    pub allow_rejection: bool,
}

/// Ordered requests of increasing symptom severity.
#[derive(Debug, Clone, PartialEq)]
pub struct SeveritySeries {
    /// Stable series name.
    pub name: &'static str,
    /// Priority tier.
    pub priority: Priority,
    /// Requests in ascending severity.
    pub steps: Vec<InferenceRequest>,
    /// Allowed confidence inversion between neighbors.
    pub tolerance: f64,
}

// ============================================================================
// SECTION: Canonical Requests
// ============================================================================

/// The canonical well-formed request (`pt-1001`).
#[must_use]
pub fn canonical_request() -> InferenceRequest {
    InferenceRequest::new("pt-1001")
        .with_age(62)
        .with_sex("female")
        .with_complaint(CANONICAL_COMPLAINT)
        .with_vital("bp_systolic", 128.0)
        .with_vital("bp_diastolic", 82.0)
        .with_vital("hr", 78.0)
}

/// Canonical request as raw JSON, for malformed variants.
fn canonical_json() -> Value {
    RequestPayload::from(canonical_request()).to_json()
}

/// Canonical JSON with one field replaced.
fn canonical_with(field: &str, value: Value) -> RequestPayload {
    let mut body = canonical_json();
    if let Some(object) = body.as_object_mut() {
        object.insert(field.to_string(), value);
    }
    RequestPayload::Malformed(body)
}

/// Canonical JSON with one field removed.
fn canonical_without(field: &str) -> RequestPayload {
    let mut body = canonical_json();
    if let Some(object) = body.as_object_mut() {
        object.remove(field);
    }
    RequestPayload::Malformed(body)
}

// ============================================================================
// SECTION: Single-Request Scenarios
// ============================================================================

/// Adverse symptoms, exertional patterns, and out-of-distribution subjects.
#[must_use]
pub fn safety_critical() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "canonical_exertional_chest_discomfort",
            category: ScenarioCategory::SafetyCritical,
            priority: Priority::P0,
            request: canonical_request().into(),
            expectation: Expectation::Classify {
                labels: &[Some(RiskLabel::ElevatedRisk)],
                confidence: Some(ConfidenceBand {
                    target: 0.82,
                    tolerance: 0.05,
                }),
                feature_terms: &[],
                no_warnings: true,
            },
        },
        Scenario {
            name: "crushing_chest_pain_escalates",
            category: ScenarioCategory::SafetyCritical,
            priority: Priority::P0,
            request: InferenceRequest::new("pt-2001")
                .with_age(58)
                .with_sex("male")
                .with_complaint("Crushing chest pain radiating to left arm, sweating, started 30 minutes ago")
                .with_vital("bp_systolic", 150.0)
                .with_vital("hr", 112.0)
                .into(),
            expectation: Expectation::Classify {
                labels: &[Some(RiskLabel::Urgent)],
                confidence: None,
                feature_terms: &["chest", "crushing", "pain"],
                no_warnings: false,
            },
        },
        Scenario {
            name: "exertional_pattern_flags_risk",
            category: ScenarioCategory::SafetyCritical,
            priority: Priority::P0,
            request: InferenceRequest::new("pt-2002")
                .with_age(55)
                .with_sex("male")
                .with_complaint("Short of breath and chest pressure after climbing two flights of stairs")
                .with_comorbidities(&["hypertension", "type 2 diabetes"])
                .with_meds(&["metformin", "lisinopril"])
                .into(),
            expectation: Expectation::Classify {
                labels: &[Some(RiskLabel::ElevatedRisk), Some(RiskLabel::Urgent)],
                confidence: None,
                feature_terms: &["chest", "exert", "pressure", "breath"],
                no_warnings: false,
            },
        },
        Scenario {
            name: "pediatric_age_is_out_of_distribution",
            category: ScenarioCategory::SafetyCritical,
            priority: Priority::P0,
            request: InferenceRequest::new("pt-3001")
                .with_age(8)
                .with_sex("male")
                .with_complaint("Chest pain after playing football")
                .into(),
            expectation: Expectation::OodWarning {
                warning_terms: OOD_WARNING_TERMS,
            },
        },
        Scenario {
            name: "pediatric_oncology_domain_is_out_of_distribution",
            category: ScenarioCategory::SafetyCritical,
            priority: Priority::P1,
            request: InferenceRequest::new("pt-3002")
                .with_age(34)
                .with_sex("female")
                .with_complaint("Fatigue and chest discomfort during chemotherapy cycle")
                .with_domain_hint("pediatric_oncology")
                .into(),
            expectation: Expectation::OodWarning {
                warning_terms: OOD_WARNING_TERMS,
            },
        },
    ]
}

/// Requests embedding a synthetic name and phone number.
#[must_use]
pub fn privacy_probes() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "phi_name_and_phone_not_echoed",
            category: ScenarioCategory::Privacy,
            priority: Priority::P0,
            request: InferenceRequest::new("pt-4001")
                .with_age(47)
                .with_sex("female")
                .with_complaint("Patient Anita Rao, phone 9876543210, reports chest pain on exertion")
                .into(),
            expectation: Expectation::Accept,
        },
        Scenario {
            name: "phi_formatted_phone_not_echoed",
            category: ScenarioCategory::Privacy,
            priority: Priority::P0,
            request: InferenceRequest::new("pt-4002")
                .with_age(51)
                .with_sex("male")
                .with_complaint(
                    "Rahul Mehta called from +91 98765-43210 about chest tightness while walking",
                )
                .into(),
            expectation: Expectation::Accept,
        },
    ]
}

/// Vague complaints and wrong-typed or missing fields.
#[must_use]
pub fn low_signal_and_invalid() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "vague_complaint_defers",
            category: ScenarioCategory::LowSignalInvalid,
            priority: Priority::P1,
            request: InferenceRequest::new("pt-5001")
                .with_age(40)
                .with_sex("female")
                .with_complaint("Feeling a bit off lately, not sure why")
                .into(),
            expectation: Expectation::DeferOrReject,
        },
        Scenario {
            name: "age_as_words_rejected",
            category: ScenarioCategory::LowSignalInvalid,
            priority: Priority::P0,
            request: canonical_with("age", json!("sixty two")),
            expectation: Expectation::Reject,
        },
        Scenario {
            name: "missing_patient_id_rejected",
            category: ScenarioCategory::LowSignalInvalid,
            priority: Priority::P1,
            request: canonical_without("patient_id"),
            expectation: Expectation::Reject,
        },
        Scenario {
            name: "empty_patient_id_rejected",
            category: ScenarioCategory::LowSignalInvalid,
            priority: Priority::P1,
            request: canonical_with("patient_id", json!("")),
            expectation: Expectation::Reject,
        },
        Scenario {
            name: "non_numeric_vital_rejected",
            category: ScenarioCategory::LowSignalInvalid,
            priority: Priority::P2,
            request: canonical_with("vitals", json!({ "hr": "fast", "bp_systolic": 128 })),
            expectation: Expectation::Reject,
        },
    ]
}

/// Age domain edges: minors are out of distribution, out-of-range ages are rejected.
#[must_use]
pub fn boundary_ages() -> Vec<Scenario> {
    /// Builds a boundary request for one age.
    fn aged(patient_id: &str, age: i64) -> RequestPayload {
        InferenceRequest::new(patient_id)
            .with_age(age)
            .with_sex("female")
            .with_complaint(CANONICAL_COMPLAINT)
            .into()
    }
    let ood = Expectation::OodWarning {
        warning_terms: OOD_WARNING_TERMS,
    };
    vec![
        Scenario {
            name: "age_0_out_of_distribution",
            category: ScenarioCategory::Boundary,
            priority: Priority::P1,
            request: aged("pt-6000", 0),
            expectation: ood.clone(),
        },
        Scenario {
            name: "age_17_out_of_distribution",
            category: ScenarioCategory::Boundary,
            priority: Priority::P1,
            request: aged("pt-6017", 17),
            expectation: ood,
        },
        Scenario {
            name: "age_18_accepted",
            category: ScenarioCategory::Boundary,
            priority: Priority::P1,
            request: aged("pt-6018", 18),
            expectation: Expectation::Accept,
        },
        Scenario {
            name: "age_120_accepted",
            category: ScenarioCategory::Boundary,
            priority: Priority::P2,
            request: aged("pt-6120", 120),
            expectation: Expectation::Accept,
        },
        Scenario {
            name: "age_negative_rejected",
            category: ScenarioCategory::Boundary,
            priority: Priority::P1,
            request: aged("pt-6999", -1),
            expectation: Expectation::Reject,
        },
        Scenario {
            name: "age_121_rejected",
            category: ScenarioCategory::Boundary,
            priority: Priority::P2,
            request: aged("pt-6121", 121),
            expectation: Expectation::Reject,
        },
    ]
}

/// Builds a complaint of at least `bytes` bytes from repeated clinical sentences.
#[must_use]
pub fn long_narrative_text(bytes: usize) -> String {
    const SENTENCES: [&str; 3] = [
        "Intermittent chest discomfort on exertion with occasional sweating. ",
        "Symptoms ease after rest and recur when climbing stairs. ",
        "No prior cardiac workup documented in available notes. ",
    ];
    let mut text = String::with_capacity(bytes + 64);
    let mut index = 0;
    while text.len() < bytes {
        text.push_str(SENTENCES[index % SENTENCES.len()]);
        index += 1;
    }
    text
}

/// Oversized free-text complaint: accept, or reject cleanly with 413/422.
#[must_use]
pub fn long_narrative() -> Scenario {
    Scenario {
        name: "long_narrative_handled",
        category: ScenarioCategory::FormatVariation,
        priority: Priority::P2,
        request: InferenceRequest::new("pt-7001")
            .with_age(66)
            .with_sex("male")
            .with_complaint(long_narrative_text(LONG_NARRATIVE_BYTES))
            .into(),
        expectation: Expectation::AcceptOrReject {
            statuses: &[200, 413, 422],
        },
    }
}

/// Every single-request scenario in catalog order.
#[must_use]
pub fn single_request_scenarios() -> Vec<Scenario> {
    let mut scenarios = safety_critical();
    scenarios.extend(privacy_probes());
    scenarios.extend(low_signal_and_invalid());
    scenarios.extend(boundary_ages());
    scenarios.push(long_narrative());
    scenarios
}

// ============================================================================
// SECTION: Variant Groups
// ============================================================================

/// Builds a language variant sharing the canonical subject.
fn language_request(complaint: &str) -> InferenceRequest {
    InferenceRequest::new("pt-8001")
        .with_age(59)
        .with_sex("male")
        .with_complaint(complaint)
        .with_vital("hr", 84.0)
}

/// Code-mixed, misspelled, synonym, emoji, and case renderings.
#[must_use]
pub fn language_variants() -> VariantGroup {
    VariantGroup {
        name: "language_robustness",
        category: ScenarioCategory::LanguageRobustness,
        priority: Priority::P1,
        canonical: language_request("Chest tightness when walking uphill, eases with rest"),
        variants: vec![
            Variant {
                label: "hinglish",
                request: language_request("Kal se chest tightness ho raha, walking pe zyada.")
                    .with_language("hi-en"),
            },
            Variant {
                label: "typos",
                request: language_request("chest tigthness wen walkng uphil, eses with rest"),
            },
            Variant {
                label: "synonym",
                request: language_request("Pressure in the chest on exertion, settles when resting"),
            },
            Variant {
                label: "emoji",
                request: language_request(
                    "Chest tightness \u{1f623} when walking uphill \u{1f6b6}, eases with rest",
                ),
            },
            Variant {
                label: "upper_case",
                request: language_request("CHEST TIGHTNESS WHEN WALKING UPHILL, EASES WITH REST"),
            },
        ],
        policy: StabilityPolicy::Adjacent {
            tolerance: 0.15,
        },
        allow_rejection: false,
    }
}

/// Onset dates in several external representations.
#[must_use]
pub fn date_format_variants() -> VariantGroup {
    let dated = |onset: &str| canonical_request().with_onset_date(onset);
    VariantGroup {
        name: "date_formats",
        category: ScenarioCategory::FormatVariation,
        priority: Priority::P1,
        canonical: dated("2025-02-01"),
        variants: ["01/02/2025", "2025/02/01", "Feb 1, 2025", "3 days ago"]
            .into_iter()
            .zip(["day_month_year", "slashed_iso", "month_name", "relative"])
            .map(|(onset, label)| Variant {
                label,
                request: dated(onset),
            })
            .collect(),
        policy: StabilityPolicy::Equivalent {
            tolerance: 0.05,
        },
        allow_rejection: true,
    }
}

/// Sex/gender in accepted synonyms, including the null category.
#[must_use]
pub fn sex_variants() -> VariantGroup {
    let mut unspecified = canonical_request();
    unspecified.sex = None;
    let mut variants: Vec<Variant> = [
        ("upper_initial", "F"),
        ("lower_initial", "f"),
        ("declined", "prefer not to say"),
        ("nonbinary", "nonbinary"),
    ]
    .into_iter()
    .map(|(label, sex)| Variant {
        label,
        request: canonical_request().with_sex(sex),
    })
    .collect();
    variants.push(Variant {
        label: "null",
        request: unspecified,
    });
    VariantGroup {
        name: "sex_representations",
        category: ScenarioCategory::FormatVariation,
        priority: Priority::P1,
        canonical: canonical_request(),
        variants,
        policy: StabilityPolicy::Equivalent {
            tolerance: 0.05,
        },
        allow_rejection: false,
    }
}

/// Metric vitals versus imperial units written into the complaint.
#[must_use]
pub fn unit_variants() -> VariantGroup {
    let base = |complaint: &str| {
        InferenceRequest::new("pt-8101")
            .with_age(64)
            .with_sex("female")
            .with_complaint(complaint)
            .with_vital("hr", 96.0)
    };
    VariantGroup {
        name: "unit_formats",
        category: ScenarioCategory::FormatVariation,
        priority: Priority::P2,
        canonical: base("Chest discomfort on exertion with fever, weight 75 kg")
            .with_vital("temp_c", 38.0),
        variants: vec![
            Variant {
                label: "fahrenheit_in_text",
                request: base("Chest discomfort on exertion with fever of 100.4 F, weight 75 kg"),
            },
            Variant {
                label: "pounds_in_text",
                request: base("Chest discomfort on exertion with fever, weight 165 lb")
                    .with_vital("temp_c", 38.0),
            },
        ],
        policy: StabilityPolicy::Equivalent {
            tolerance: 0.05,
        },
        allow_rejection: false,
    }
}

/// Every variant group in catalog order.
#[must_use]
pub fn variant_groups() -> Vec<VariantGroup> {
    vec![language_variants(), date_format_variants(), sex_variants(), unit_variants()]
}

// ============================================================================
// SECTION: Gradient
// ============================================================================

/// Otherwise-identical requests of increasing symptom severity.
#[must_use]
pub fn confidence_gradient() -> SeveritySeries {
    let steps = [
        "Feeling a bit off lately, not sure why",
        "Mild chest discomfort now and then",
        "Chest pressure on exertion, worse on stairs",
        "Crushing chest pain right now with sweating",
    ]
    .into_iter()
    .map(|complaint| {
        InferenceRequest::new("pt-9001")
            .with_age(61)
            .with_sex("male")
            .with_complaint(complaint)
            .with_vital("hr", 88.0)
    })
    .collect();
    SeveritySeries {
        name: "confidence_gradient",
        priority: Priority::P1,
        steps,
        tolerance: 0.05,
    }
}
