// crates/riskprobe-mock/src/classifier_tests.rs
// ============================================================================
// Module: Mock Classifier Unit Tests
// Description: Validation and keyword classification coverage.
// Purpose: Keep the mock consistent with the scenario catalog it serves.
// Dependencies: riskprobe-core, serde_json
// ============================================================================

//! ## Overview
//! The mock is the oracle every in-process run relies on, so these tests pin
//! it to the catalog: each single-request scenario must pass its own
//! expectation against the compliant mock.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::use_debug,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use riskprobe_core::EchoPolicy;
use riskprobe_core::FeatureVocabulary;
use riskprobe_core::RiskLabel;
use riskprobe_core::assertions::assert_no_full_text_echo;
use riskprobe_core::assertions::assert_no_phi_echo;
use riskprobe_core::assertions::assert_response_contract;
use riskprobe_core::scenarios;
use serde_json::Value;
use serde_json::json;

use crate::classifier::MockMode;
use crate::classifier::OFF_CONTRACT_LABEL;
use crate::classifier::respond;
use crate::classifier::validate_request;

fn class_of(body: &Value) -> Option<&str> {
    body.get("class").and_then(Value::as_str)
}

#[test]
fn canonical_request_is_elevated_risk() {
    let body = scenarios::canonical_request();
    let reply = respond(&serde_json::to_value(&body).unwrap(), MockMode::Compliant);
    assert_eq!(reply.status, 200);
    let response = assert_response_contract(&reply.body).unwrap();
    assert_eq!(response.label(), Ok(Some(RiskLabel::ElevatedRisk)));
    assert!((response.confidence - 0.82).abs() < 1e-9);
    assert!(response.warnings.is_empty());
}

#[test]
fn every_single_request_scenario_passes_against_compliant_mock() {
    let vocabulary = FeatureVocabulary::default();
    for scenario in scenarios::single_request_scenarios() {
        let reply = respond(&scenario.request.to_json(), MockMode::Compliant);
        let verdict = scenario.expectation.verify(reply.status, Some(&reply.body), 0.7, &vocabulary);
        assert!(verdict.is_ok(), "{}: {}", scenario.name, verdict.unwrap_err());
    }
}

#[test]
fn missing_and_mistyped_fields_are_named() {
    let errors = validate_request(&json!({ "age": "sixty two", "vitals": { "hr": "fast" } }))
        .unwrap_err();
    let fields: Vec<&str> = errors.iter().map(|error| error.field.as_str()).collect();
    assert_eq!(fields, vec!["patient_id", "age", "vitals"]);

    let reply = respond(&json!([1, 2, 3]), MockMode::Compliant);
    assert_eq!(reply.status, 422);
    assert_eq!(reply.body["detail"][0]["loc"], json!(["body"]));
}

#[test]
fn age_bounds_are_inclusive() {
    for (age, ok) in [(-1, false), (0, true), (120, true), (121, false)] {
        let body = json!({ "patient_id": "pt-1", "age": age });
        assert_eq!(validate_request(&body).is_ok(), ok, "age {age}");
    }
    assert!(validate_request(&json!({ "patient_id": "pt-1", "age": 62.5 })).is_err());
}

#[test]
fn pediatric_domain_hint_is_out_of_distribution() {
    let body = json!({ "patient_id": "pt-1", "age": 40, "domain_hint": "Pediatric_Oncology" });
    let reply = respond(&body, MockMode::Compliant);
    assert_eq!(class_of(&reply.body), Some("needs_review"));
    let warnings = reply.body["warnings"].to_string();
    assert!(warnings.contains("out-of-distribution"));
}

#[test]
fn echo_mode_leaks_complaint_and_is_detected() {
    let scenario = scenarios::privacy_probes().remove(0);
    let reply = respond(&scenario.request.to_json(), MockMode::EchoComplaint);
    assert_eq!(reply.status, 200);
    let raw = reply.body.to_string();
    assert!(assert_no_phi_echo(&scenario.request, &raw, Some(&reply.body)).is_err());
    assert!(
        assert_no_full_text_echo(&scenario.request, &raw, Some(&reply.body), EchoPolicy::ExactSubstring)
            .is_err()
    );
}

#[test]
fn off_contract_mode_replaces_classified_labels_only() {
    let canonical = serde_json::to_value(scenarios::canonical_request()).unwrap();
    let reply = respond(&canonical, MockMode::OffContractLabel);
    assert_eq!(class_of(&reply.body), Some(OFF_CONTRACT_LABEL));
    assert!(assert_response_contract(&reply.body).is_err());

    let vague = json!({ "patient_id": "pt-1", "chief_complaint": "not sure" });
    let reply = respond(&vague, MockMode::OffContractLabel);
    assert_eq!(class_of(&reply.body), Some("needs_review"));
}

#[test]
fn gradient_confidence_never_decreases() {
    let confidences: Vec<f64> = scenarios::confidence_gradient()
        .steps
        .iter()
        .map(|step| {
            let reply = respond(&serde_json::to_value(step).unwrap(), MockMode::Compliant);
            reply.body["confidence"].as_f64().unwrap()
        })
        .collect();
    assert!(confidences.windows(2).all(|pair| pair[1] >= pair[0]), "{confidences:?}");
}
