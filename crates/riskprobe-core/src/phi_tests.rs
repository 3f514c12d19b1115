// crates/riskprobe-core/src/phi_tests.rs
// ============================================================================
// Module: PHI Detection Unit Tests
// Description: Unit and property coverage for sensitive-token extraction.
// Purpose: Ensure synthetic names and phone numbers are always detected.
// Dependencies: proptest, serde_json
// ============================================================================

//! ## Overview
//! Unit and property coverage for PHI token extraction and matching.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use proptest::prelude::*;
use serde_json::json;

use crate::model::InferenceRequest;
use crate::model::RequestPayload;
use crate::phi::NON_NAME_WORDS;
use crate::phi::PhiKind;
use crate::phi::PhiToken;
use crate::phi::echoed_tokens;
use crate::phi::mask;
use crate::phi::name_tokens;
use crate::phi::phone_numbers;
use crate::phi::response_haystack;
use crate::phi::scan_request;

fn values_of(tokens: &[PhiToken], kind: PhiKind) -> Vec<&str> {
    tokens.iter().filter(|token| token.kind == kind).map(|token| token.value.as_str()).collect()
}

#[test]
fn names_skip_clinical_vocabulary() {
    assert_eq!(name_tokens("Patient Anita Rao reports pain").unwrap(), vec!["Anita", "Rao"]);
    assert!(name_tokens("Crushing Chest Pain since Monday").unwrap().is_empty());
    assert!(name_tokens("chest pain on exertion").unwrap().is_empty());
    assert!(name_tokens("Kal se chest tightness ho raha").unwrap().is_empty());
}

#[test]
fn phones_require_seven_digits() {
    assert_eq!(phone_numbers("call 9876543210 now").unwrap(), vec!["9876543210"]);
    assert_eq!(phone_numbers("ring (987) 654-3210").unwrap(), vec!["987) 654-3210"]);
    assert!(phone_numbers("bp 128/82, hr 78, temp 100.4").unwrap().is_empty());
    assert!(phone_numbers("code 123456").unwrap().is_empty());
}

#[test]
fn scan_collects_every_kind_once() {
    let payload: RequestPayload = InferenceRequest::new("pt-4002")
        .with_complaint("Rahul Mehta called from +91 98765-43210 about chest tightness")
        .into();
    let tokens = scan_request(&payload).unwrap();
    assert_eq!(values_of(&tokens, PhiKind::PatientId), vec!["pt-4002"]);
    assert_eq!(values_of(&tokens, PhiKind::Name), vec!["Mehta", "Rahul"]);
    let phones = values_of(&tokens, PhiKind::Phone);
    assert!(phones.contains(&"919876543210"));
    assert!(phones.contains(&"+91 98765-43210"));
    assert_eq!(phones.len(), 2);
}

#[test]
fn scan_reads_malformed_payloads() {
    let payload = RequestPayload::Malformed(json!({
        "patient_id": "pt-9999",
        "age": "sixty two",
        "chief_complaint": "Maria Lopez 5550001111"
    }));
    let tokens = scan_request(&payload).unwrap();
    assert_eq!(tokens.len(), 6);
    let without_id = RequestPayload::Malformed(json!({ "age": 3 }));
    assert!(scan_request(&without_id).unwrap().is_empty());
}

#[test]
fn short_patient_ids_are_not_scanned() {
    let payload: RequestPayload = InferenceRequest::new("p1").into();
    assert!(scan_request(&payload).unwrap().is_empty());
}

#[test]
fn haystack_includes_keys_and_decoded_leaves() {
    let body = json!({ "Echo": ["A\u{00e9}b"], "n": 1 });
    let haystack = response_haystack("{}", Some(&body));
    assert!(haystack.full().contains("echo"));
    assert!(haystack.full().contains("a\u{00e9}b"));
    assert!(!haystack.strings().contains("{}"));
}

#[test]
fn echo_matching_ignores_case() {
    let tokens = vec![PhiToken {
        kind: PhiKind::Name,
        value: "Anita".to_string(),
    }];
    assert_eq!(echoed_tokens(&tokens, &response_haystack("hello ANITA", None)).len(), 1);
    assert!(echoed_tokens(&tokens, &response_haystack("hello ana", None)).is_empty());
}

#[test]
fn phone_fragments_cover_prefix_and_suffix() {
    let payload: RequestPayload =
        InferenceRequest::new("pt-1").with_complaint("Anita Rao, phone 9876543210").into();
    let tokens = scan_request(&payload).unwrap();
    assert_eq!(values_of(&tokens, PhiKind::PhoneFragment), vec!["43210", "98765"]);

    let with_code: RequestPayload =
        InferenceRequest::new("pt-1").with_complaint("call +91 98765-43210").into();
    let tokens = scan_request(&with_code).unwrap();
    assert_eq!(values_of(&tokens, PhiKind::PhoneFragment), vec!["43210", "91987", "98765"]);
}

#[test]
fn phone_fragments_match_strings_not_numbers() {
    let tokens = vec![PhiToken {
        kind: PhiKind::PhoneFragment,
        value: "98765".to_string(),
    }];
    let leaked = json!({ "warnings": ["callback number starts 98765"] });
    let raw = leaked.to_string();
    assert_eq!(echoed_tokens(&tokens, &response_haystack(&raw, Some(&leaked))).len(), 1);

    let numeric = json!({ "confidence": 0.987_65 });
    let raw = numeric.to_string();
    assert!(echoed_tokens(&tokens, &response_haystack(&raw, Some(&numeric))).is_empty());
}

#[test]
fn names_match_whole_words_only() {
    let tokens = vec![PhiToken {
        kind: PhiKind::Name,
        value: "Pat".to_string(),
    }];
    let body = json!({ "explanations": [{ "feature": "exertional_pattern", "weight": 0.4 }] });
    let raw = body.to_string();
    assert!(echoed_tokens(&tokens, &response_haystack(&raw, Some(&body))).is_empty());
    assert!(echoed_tokens(&tokens, &response_haystack("patient pattern", None)).is_empty());
    assert_eq!(echoed_tokens(&tokens, &response_haystack("seen by pat today", None)).len(), 1);
    assert_eq!(echoed_tokens(&tokens, &response_haystack("\"Pat\"", None)).len(), 1);
}

#[test]
fn mask_hides_all_but_first_character() {
    assert_eq!(mask("9876543210"), "9***(10 chars)");
    assert_eq!(mask(""), "***(0 chars)");
}

proptest! {
    #[test]
    fn synthetic_phone_numbers_are_detected(
        digits in "[2-9][0-9]{9}",
        separator in prop_oneof![Just(""), Just(" "), Just("-"), Just(".")],
    ) {
        let formatted = format!("{}{separator}{}{separator}{}", &digits[.. 3], &digits[3 .. 6], &digits[6 ..]);
        let complaint = format!("call me on {formatted} about chest pain");
        let payload: RequestPayload = InferenceRequest::new("pt-1").with_complaint(complaint).into();
        let tokens = scan_request(&payload).unwrap();
        prop_assert!(tokens.iter().any(|token| token.kind == PhiKind::Phone && token.value == digits));
        let haystack = response_haystack(&format!("{{\"note\":\"{digits}\"}}"), None);
        prop_assert!(tokens.iter().any(|token| token.kind == PhiKind::PhoneFragment && token.value == digits[.. 5]));
        prop_assert!(!echoed_tokens(&tokens, &haystack).is_empty());
    }

    #[test]
    fn synthetic_names_are_detected(first in "[A-Z][a-z]{3,8}", last in "[A-Z][a-z]{3,8}") {
        let complaint = format!("Seen by {first} {last} yesterday");
        let names = name_tokens(&complaint).unwrap();
        let lowered: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();
        let blocked = |word: &str| NON_NAME_WORDS.contains(&word.to_lowercase().as_str());
        if !blocked(&first) {
            prop_assert!(lowered.contains(&first.to_lowercase()));
        }
        if !blocked(&last) {
            prop_assert!(lowered.contains(&last.to_lowercase()));
        }
    }

    #[test]
    fn scanning_never_panics(text in ".{0,200}") {
        let payload: RequestPayload = InferenceRequest::new("pt-1").with_complaint(text).into();
        prop_assert!(scan_request(&payload).is_ok());
    }
}
