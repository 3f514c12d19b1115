// crates/riskprobe-core/src/assertions_tests.rs
// ============================================================================
// Module: Contract Assertion Unit Tests
// Description: Unit coverage for schema, label, PHI, and confidence predicates.
// Purpose: Ensure every assertion fails closed and names the violated field.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Unit coverage for the contract assertions.
//! Invariants:
//! - Missing required fields are named in the failure message.
//! - Off-contract labels are never accepted.
//! - PHI failure messages never repeat the leaked token.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use serde_json::Value;
use serde_json::json;

use crate::assertions::ContractError;
use crate::assertions::EchoPolicy;
use crate::assertions::FeatureVocabulary;
use crate::assertions::assert_confidence_floor;
use crate::assertions::assert_confidence_non_decreasing;
use crate::assertions::assert_confidence_within;
use crate::assertions::assert_explanations_present;
use crate::assertions::assert_features_mention;
use crate::assertions::assert_label_in;
use crate::assertions::assert_label_whitelisted;
use crate::assertions::assert_labels_adjacent;
use crate::assertions::assert_no_full_text_echo;
use crate::assertions::assert_no_phi_echo;
use crate::assertions::assert_response_contract;
use crate::assertions::assert_same_class;
use crate::assertions::assert_schema_valid;
use crate::assertions::assert_status;
use crate::assertions::assert_warning_mentions;
use crate::model::InferenceRequest;
use crate::model::InferenceResponse;
use crate::model::RequestPayload;
use crate::model::RiskLabel;

fn body(class: Value, confidence: f64) -> Value {
    json!({
        "class": class,
        "confidence": confidence,
        "explanations": [{ "feature": "chest", "weight": 0.6 }],
        "warnings": [],
        "model_version": "test-1"
    })
}

fn response(class: Option<&str>, confidence: f64) -> InferenceResponse {
    let class = class.map_or(Value::Null, |label| json!(label));
    assert_schema_valid(&body(class, confidence)).expect("valid body")
}

fn phi_request() -> RequestPayload {
    InferenceRequest::new("pt-4001")
        .with_age(47)
        .with_complaint("Patient Anita Rao, phone 9876543210, reports chest pain on exertion")
        .into()
}

#[test]
fn schema_accepts_contract_body() {
    let decoded = assert_schema_valid(&body(json!("elevated_risk"), 0.82)).unwrap();
    assert_eq!(decoded.class.as_deref(), Some("elevated_risk"));
    assert!(decoded.warnings.is_empty());
}

#[test]
fn schema_names_missing_field() {
    for field in ["class", "confidence", "explanations", "model_version"] {
        let mut value = body(json!("urgent"), 0.9);
        value.as_object_mut().unwrap().remove(field);
        let err = assert_schema_valid(&value).unwrap_err();
        match err {
            ContractError::Schema(message) => assert!(message.contains(field), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn schema_rejects_out_of_range_confidence() {
    for confidence in [-0.01, 1.01] {
        let err = assert_schema_valid(&body(json!("urgent"), confidence)).unwrap_err();
        assert!(matches!(err, ContractError::Schema(_)));
    }
}

#[test]
fn schema_rejects_mistyped_fields() {
    let mut value = body(json!("urgent"), 0.9);
    value["confidence"] = json!("0.9");
    assert!(matches!(assert_schema_valid(&value), Err(ContractError::Schema(_))));

    let mut value = body(json!(7), 0.9);
    value["model_version"] = json!("v");
    assert!(matches!(assert_schema_valid(&value), Err(ContractError::Schema(_))));

    assert!(matches!(assert_schema_valid(&json!([1, 2])), Err(ContractError::Schema(_))));
}

#[test]
fn schema_defaults_missing_warnings() {
    let mut value = body(json!("urgent"), 0.9);
    value.as_object_mut().unwrap().remove("warnings");
    assert!(assert_schema_valid(&value).unwrap().warnings.is_empty());
}

#[test]
fn whitelist_accepts_null_and_known_labels() {
    assert_eq!(assert_label_whitelisted(&response(None, 0.4)).unwrap(), None);
    for label in RiskLabel::ALL {
        let decoded = response(Some(label.as_str()), 0.9);
        assert_eq!(assert_label_whitelisted(&decoded).unwrap(), Some(label));
    }
}

#[test]
fn whitelist_rejects_off_contract_label() {
    let err = assert_label_whitelisted(&response(Some("low_risk"), 0.9)).unwrap_err();
    match err {
        ContractError::ContractViolation(message) => assert!(message.contains("low_risk")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn contract_requires_explanations_when_classified() {
    let mut value = body(json!("urgent"), 0.95);
    value["explanations"] = json!([]);
    assert!(matches!(
        assert_response_contract(&value),
        Err(ContractError::ContractViolation(_))
    ));

    let mut value = body(Value::Null, 0.3);
    value["explanations"] = json!([]);
    assert!(assert_response_contract(&value).is_ok());
}

#[test]
fn label_in_reports_expected_set() {
    let decoded = response(Some("needs_review"), 0.45);
    assert!(assert_label_in(&decoded, &[Some(RiskLabel::NeedsReview), None]).is_ok());
    let err = assert_label_in(&decoded, &[Some(RiskLabel::Urgent)]).unwrap_err();
    assert!(err.to_string().contains("urgent"));
}

#[test]
fn phi_echo_detects_name_phone_and_patient_id() {
    let request = phi_request();
    for leaked in ["Anita", "9876543210", "pt-4001", "RAO"] {
        let value = json!({ "class": null, "warnings": [format!("seen {leaked}")] });
        let raw = value.to_string();
        let err = assert_no_phi_echo(&request, &raw, Some(&value)).unwrap_err();
        match err {
            ContractError::PhiLeak(message) => {
                assert!(!message.to_lowercase().contains(&leaked.to_lowercase()), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn phi_echo_passes_clean_response() {
    let value = body(json!("elevated_risk"), 0.82);
    let raw = value.to_string();
    assert!(assert_no_phi_echo(&phi_request(), &raw, Some(&value)).is_ok());
}

#[test]
fn phi_echo_detects_partial_phone_number() {
    let value = json!({
        "class": "elevated_risk",
        "confidence": 0.82,
        "explanations": [{ "feature": "chest", "weight": 0.6 }],
        "warnings": ["callback number starts 98765"],
        "model_version": "test-1"
    });
    let raw = value.to_string();
    let err = assert_no_phi_echo(&phi_request(), &raw, Some(&value)).unwrap_err();
    match err {
        ContractError::PhiLeak(message) => {
            assert!(message.contains("phone_fragment"), "{message}");
            assert!(!message.contains("98765"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn phi_echo_ignores_short_name_inside_feature_names() {
    let request: RequestPayload = InferenceRequest::new("pt-4100")
        .with_age(58)
        .with_complaint("Pat Lee reports chest pain on exertion climbing stairs")
        .into();
    let value = json!({
        "class": "elevated_risk",
        "confidence": 0.82,
        "explanations": [
            { "feature": "chest", "weight": 0.6 },
            { "feature": "exertional_pattern", "weight": 0.3 }
        ],
        "warnings": [],
        "model_version": "mock-1.0.0"
    });
    let raw = value.to_string();
    assert!(assert_no_phi_echo(&request, &raw, Some(&value)).is_ok());

    let leaked = json!({ "class": null, "warnings": ["seen Pat today"] });
    let raw = leaked.to_string();
    assert!(matches!(
        assert_no_phi_echo(&request, &raw, Some(&leaked)),
        Err(ContractError::PhiLeak(_))
    ));
}

#[test]
fn phi_echo_sees_through_json_escaping() {
    let request: RequestPayload =
        InferenceRequest::new("pt-1").with_complaint("Call Zoë Müller at 555 123 4567").into();
    let value = json!({ "note": "digits 5551234567" });
    let raw = "{\"note\":\"digits \\u0035551234567\"}";
    assert!(matches!(
        assert_no_phi_echo(&request, raw, Some(&value)),
        Err(ContractError::PhiLeak(_))
    ));
}

#[test]
fn full_text_echo_exact_substring() {
    let request = phi_request();
    let complaint = request.chief_complaint().unwrap().to_uppercase();
    let value = json!({ "warnings": [complaint] });
    let raw = value.to_string();
    assert!(matches!(
        assert_no_full_text_echo(&request, &raw, Some(&value), EchoPolicy::ExactSubstring),
        Err(ContractError::PhiLeak(_))
    ));

    let partial = json!({ "warnings": ["chest pain on exertion"] });
    let raw = partial.to_string();
    assert!(
        assert_no_full_text_echo(&request, &raw, Some(&partial), EchoPolicy::ExactSubstring)
            .is_ok()
    );
}

#[test]
fn full_text_echo_word_overlap() {
    let request: RequestPayload = InferenceRequest::new("pt-1")
        .with_complaint("Persistent exertional tightness radiating towards shoulder")
        .into();
    let paraphrase = json!({ "warnings": ["persistent exertional tightness radiating, noted"] });
    let raw = paraphrase.to_string();
    assert!(matches!(
        assert_no_full_text_echo(&request, &raw, Some(&paraphrase), EchoPolicy::DEFAULT_OVERLAP),
        Err(ContractError::PhiLeak(_))
    ));

    let summary = json!({ "warnings": ["exertional symptoms"] });
    let raw = summary.to_string();
    assert!(
        assert_no_full_text_echo(&request, &raw, Some(&summary), EchoPolicy::DEFAULT_OVERLAP)
            .is_ok()
    );
}

#[test]
fn full_text_echo_skips_short_complaints() {
    let request: RequestPayload = InferenceRequest::new("pt-1").with_complaint("chest").into();
    let value = body(json!("elevated_risk"), 0.82);
    let raw = value.to_string();
    assert!(
        assert_no_full_text_echo(&request, &raw, Some(&value), EchoPolicy::ExactSubstring).is_ok()
    );
}

#[test]
fn explanations_require_known_feature_and_numeric_weight() {
    let vocabulary = FeatureVocabulary::default();
    assert!(assert_explanations_present(&response(Some("urgent"), 0.9), &vocabulary).is_ok());

    let mut value = body(json!("urgent"), 0.9);
    value["explanations"] = json!([{ "feature": "favourite_colour", "weight": 0.2 }]);
    let decoded = assert_schema_valid(&value).unwrap();
    let err = assert_explanations_present(&decoded, &vocabulary).unwrap_err();
    assert!(err.to_string().contains("favourite_colour"));

    value["explanations"] = json!([{ "feature": "chest", "weight": null }]);
    let decoded = assert_schema_valid(&value).unwrap();
    let err = assert_explanations_present(&decoded, &vocabulary).unwrap_err();
    assert!(err.to_string().contains("weight"));

    value["explanations"] = json!([]);
    let decoded = assert_schema_valid(&value).unwrap();
    assert!(assert_explanations_present(&decoded, &vocabulary).is_err());
}

#[test]
fn custom_vocabulary_is_case_insensitive() {
    let vocabulary = FeatureVocabulary::new(["Troponin"]);
    assert!(vocabulary.is_known("troponin_level"));
    assert!(!vocabulary.is_known("chest"));
    assert!(!vocabulary.is_known("   "));
}

#[test]
fn features_mention_any_term() {
    let decoded = response(Some("urgent"), 0.95);
    assert!(assert_features_mention(&decoded, &["CHEST"]).is_ok());
    assert!(assert_features_mention(&decoded, &[]).is_ok());
    assert!(assert_features_mention(&decoded, &["syncope"]).is_err());
}

#[test]
fn warning_mentions_is_case_insensitive() {
    let mut value = body(json!("needs_review"), 0.4);
    value["warnings"] = json!(["Out-of-distribution: pediatric patient"]);
    let decoded = assert_schema_valid(&value).unwrap();
    assert!(assert_warning_mentions(&decoded, &["PEDIATRIC"]).is_ok());
    assert!(assert_warning_mentions(&decoded, &["renal"]).is_err());
}

#[test]
fn status_membership() {
    assert!(assert_status(422, &[200, 422]).is_ok());
    let err = assert_status(500, &[200]).unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[test]
fn confidence_floor_exempts_deferred_labels() {
    assert!(assert_confidence_floor(&response(Some("needs_review"), 0.1), 0.7).is_ok());
    assert!(assert_confidence_floor(&response(None, 0.1), 0.7).is_ok());
    assert!(assert_confidence_floor(&response(Some("urgent"), 0.7), 0.7).is_ok());
    assert!(matches!(
        assert_confidence_floor(&response(Some("elevated_risk"), 0.69), 0.7),
        Err(ContractError::ContractViolation(_))
    ));
}

#[test]
fn adjacency_follows_severity_order() {
    let review = response(Some("needs_review"), 0.45);
    let elevated = response(Some("elevated_risk"), 0.82);
    let urgent = response(Some("urgent"), 0.95);
    let null = response(None, 0.3);
    assert!(assert_labels_adjacent(&review, &elevated).is_ok());
    assert!(assert_labels_adjacent(&urgent, &elevated).is_ok());
    assert!(assert_labels_adjacent(&review, &urgent).is_err());
    assert!(assert_labels_adjacent(&null, &review).is_err());
    assert!(assert_labels_adjacent(&null, &null).is_ok());
}

#[test]
fn confidence_within_tolerance() {
    let base = response(Some("elevated_risk"), 0.82);
    assert!(assert_confidence_within(&base, &response(Some("elevated_risk"), 0.9), 0.1).is_ok());
    assert!(assert_confidence_within(&base, &response(Some("elevated_risk"), 0.5), 0.1).is_err());
}

#[test]
fn non_decreasing_allows_noise_within_tolerance() {
    assert!(assert_confidence_non_decreasing(&[0.45, 0.82, 0.82, 0.95], 0.0).is_ok());
    assert!(assert_confidence_non_decreasing(&[0.45, 0.82, 0.80, 0.95], 0.05).is_ok());
    let err = assert_confidence_non_decreasing(&[0.45, 0.82, 0.6], 0.05).unwrap_err();
    assert!(err.to_string().contains("step 1"));
    assert!(assert_confidence_non_decreasing(&[], 0.0).is_ok());
}

#[test]
fn same_class_detects_drift() {
    let first = response(Some("urgent"), 0.95);
    assert!(assert_same_class(&first, &response(Some("urgent"), 0.9)).is_ok());
    assert!(assert_same_class(&first, &response(None, 0.9)).is_err());
}
