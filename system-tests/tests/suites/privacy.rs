// system-tests/tests/suites/privacy.rs
// ============================================================================
// Module: Privacy and Contract Breach System Tests
// Description: Runs against deliberately non-compliant mocks.
// Purpose: Prove the harness fails closed on PHI echo and off-contract labels.
// Dependencies: riskprobe-mock, riskprobe-suites, helpers
// ============================================================================

//! ## Overview
//! A harness that passes everything is worthless; these runs point it at a
//! mock that leaks the complaint or invents a label and check that the
//! right cases fail for the right reason.

use riskprobe_core::Tag;
use riskprobe_mock::MockBehavior;
use riskprobe_mock::MockMode;
use riskprobe_suites::run_selected;

use crate::helpers::harness::mock_session;

#[tokio::test(flavor = "multi_thread")]
async fn echo_mock_fails_phi_cases() {
    let session = mock_session(MockBehavior::default().with_mode(MockMode::EchoComplaint));
    let report = run_selected(&session, &[Tag::P0]).await;
    assert!(!report.all_passed());
    for name in ["phi_name_and_phone_not_echoed", "phi_formatted_phone_not_echoed"] {
        let outcome = report.outcome(name).expect(name);
        assert!(!outcome.passed(), "{name} should fail against an echoing API");
        assert!(outcome.detail().starts_with("PHI leak"), "{name}: {}", outcome.detail());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn phi_diagnostics_mask_leaked_values() {
    let session = mock_session(MockBehavior::default().with_mode(MockMode::EchoComplaint));
    let report = run_selected(&session, &[Tag::P0]).await;
    let outcome = report.outcome("phi_name_and_phone_not_echoed").expect("phi case");
    assert!(!outcome.detail().contains("9876543210"));
    assert!(!outcome.detail().contains("Anita"));
}

#[tokio::test(flavor = "multi_thread")]
async fn off_contract_label_is_caught() {
    let session = mock_session(MockBehavior::default().with_mode(MockMode::OffContractLabel));
    let report = run_selected(&session, &[Tag::P0]).await;
    let outcome = report.outcome("crushing_chest_pain_escalates").expect("urgent case");
    assert!(!outcome.passed());
    assert!(outcome.detail().contains("low_risk"), "{}", outcome.detail());
    assert!(outcome.detail().contains("whitelist"), "{}", outcome.detail());
}

#[tokio::test(flavor = "multi_thread")]
async fn off_contract_label_leaves_deferrals_passing() {
    let session = mock_session(MockBehavior::default().with_mode(MockMode::OffContractLabel));
    let report = run_selected(&session, &[Tag::P0]).await;
    let outcome = report.outcome("pediatric_age_is_out_of_distribution").expect("ood case");
    assert!(outcome.passed(), "{}", outcome.detail());
}
