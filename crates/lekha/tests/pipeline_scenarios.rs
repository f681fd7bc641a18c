//! End-to-end pipeline scenarios over replayed recognition passes.
//!
//! Covers:
//! - corroboration and conflict between passes
//! - degraded runs where some passes fail
//! - terminal outcomes: all passes failed, timeout, cancellation
//! - ordering invariance and determinism

use std::sync::Arc;
use std::time::Duration;

use lekha::core::RecordingSink;
use lekha::engine::RecordedPass;
use lekha::{CancelToken, FailureReason, FieldName, LekhaConfig, Outcome, PassFailure, ProgressTracker};

mod helpers;
use helpers::*;

#[tokio::test]
async fn test_corroborated_license_number_merges_to_highest_confidence() {
    let pipeline = pipeline(script(pass(CARD, 90.0), pass(CARD, 70.0)));

    let outcome = pipeline
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await;
    let document = outcome.completed().expect("run should complete");

    let license = document.record.get(FieldName::LicenseNumber).unwrap();
    assert_eq!(license.value.as_deref(), Some("03-066-041605"));
    assert_eq!(license.confidence, 0.9);
    assert_eq!(license.sources, vec!["Standard", "Precise"]);
    assert!(license.alternatives.is_empty());

    assert!(document.validation.is_valid(), "{:?}", document.validation.messages());
    assert_eq!(document.validation.warning_count(), 0);
    assert!(document.record.failed_passes.is_empty());
}

#[tokio::test]
async fn test_conflicting_expiry_prefers_earlier_catalog_entry() {
    let precise = card_with_expiry("14-01-2031");
    let pipeline = pipeline(script(pass(CARD, 60.0), pass(&precise, 95.0)));

    let document = pipeline
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await
        .completed()
        .unwrap();

    let expiry = document.record.get(FieldName::ExpiryDate).unwrap();
    assert_eq!(expiry.value.as_deref(), Some("2030-01-14"));
    assert_eq!(expiry.confidence, 0.6);
    assert_eq!(expiry.sources, vec!["Standard"]);
    assert_eq!(expiry.alternatives.len(), 1);
    assert_eq!(expiry.alternatives[0].value, "2031-01-14");
    assert_eq!(expiry.alternatives[0].sources, vec!["Precise"]);

    // Agreeing fields are still corroborated.
    assert_eq!(document.record.get(FieldName::HolderName).unwrap().sources.len(), 2);
}

#[tokio::test]
async fn test_all_passes_failing_yields_labeled_failure() {
    let pipeline = pipeline(script(
        RecordedPass::failure("engine crashed"),
        RecordedPass::failure("corrupt image"),
    ));
    let sink = RecordingSink::new();
    let progress = ProgressTracker::new(Some(Arc::new(sink.clone())));

    let outcome = pipeline.process(image(), &progress, &CancelToken::new()).await;

    assert_eq!(outcome, Outcome::Failed(FailureReason::AllPassesFailed));
    assert_eq!(outcome.reason_code(), Some("AllPassesFailed"));
    assert!(sink.events().iter().all(|e| e.stage != "complete"));
}

#[tokio::test]
async fn test_degraded_run_keeps_single_source_fields_capped() {
    let pipeline = pipeline(script(pass(CARD, 95.0), RecordedPass::failure("engine crashed")));

    let document = pipeline
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await
        .completed()
        .unwrap();

    let license = document.record.get(FieldName::LicenseNumber).unwrap();
    assert_eq!(license.value.as_deref(), Some("03-066-041605"));
    assert_eq!(license.confidence, 0.8);
    assert_eq!(document.record.failed_passes, vec!["Precise"]);
    assert!(matches!(
        &document.passes[1],
        lekha::PassOutcome::Failed { failure: PassFailure::Engine(msg), .. } if msg.contains("engine crashed")
    ));
    assert!(
        document
            .record
            .iter()
            .all(|(_, field)| field.confidence <= 0.8)
    );
}

#[tokio::test]
async fn test_every_pass_timing_out_reports_timeout() {
    let config = LekhaConfig {
        job_timeout_ms: Some(50),
        ..Default::default()
    };
    let pipeline = pipeline_with(script(delayed(CARD, 90.0, 400), delayed(CARD, 90.0, 400)), config);

    let outcome = pipeline
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await;
    assert_eq!(outcome, Outcome::Failed(FailureReason::Timeout));
}

#[tokio::test]
async fn test_cancellation_mid_run_returns_only_cancelled() {
    let pipeline = pipeline(script(delayed(CARD, 90.0, 500), delayed(CARD, 80.0, 500)));
    let cancel = CancelToken::new();
    let sink = RecordingSink::new();
    let progress = ProgressTracker::new(Some(Arc::new(sink.clone())));

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_millis(400), pipeline.process(image(), &progress, &cancel))
        .await
        .expect("cancellation should resolve before the passes finish");

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.reason_code(), Some("Cancelled"));
    let stages: Vec<String> = sink.events().into_iter().map(|e| e.stage).collect();
    assert!(!stages.contains(&"extraction-started".to_string()));
    assert!(!stages.contains(&"complete".to_string()));

    // Cancelling after the fact is a no-op.
    cancel.cancel();
}

#[tokio::test]
async fn test_completion_order_does_not_change_the_record() {
    let precise = card_with_expiry("14-01-2031");

    let slow_first = pipeline(script(delayed(CARD, 60.0, 150), pass(&precise, 95.0)));
    let fast_first = pipeline(script(pass(CARD, 60.0), delayed(&precise, 95.0, 150)));

    let a = slow_first
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await
        .completed()
        .unwrap();
    let b = fast_first
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await
        .completed()
        .unwrap();

    assert_eq!(a.record, b.record);
    assert_eq!(a.record.value(FieldName::ExpiryDate), Some("2030-01-14"));
    assert_eq!(a.passes.iter().map(|p| p.config_name()).collect::<Vec<_>>(), vec!["Standard", "Precise"]);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let precise = card_with_expiry("14-01-2031");
    let pipeline = pipeline(script(pass(CARD, 88.0), pass(&precise, 77.0)));

    let mut serialized = Vec::new();
    for _ in 0..3 {
        let document = pipeline
            .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
            .await
            .completed()
            .unwrap();
        serialized.push(serde_json::to_string(&document).unwrap());
    }

    assert!(serialized.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(pipeline.pool().stats().completed, 6);
}

#[tokio::test]
async fn test_expiry_before_issue_is_a_record_error() {
    let card = card_with_dates("01-01-2020", "01-01-2019");
    let pipeline = pipeline(script(pass(&card, 90.0), pass(&card, 85.0)));

    let document = pipeline
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await
        .completed()
        .unwrap();

    assert_eq!(document.record.value(FieldName::IssueDate), Some("2020-01-01"));
    assert_eq!(document.record.value(FieldName::ExpiryDate), Some("2019-01-01"));
    assert!(!document.validation.is_valid());
    assert!(document.validation.record.has_error("expiry before issue"));
}

#[tokio::test]
async fn test_devanagari_card_is_normalized() {
    let text = "सवारी चालक अनुमतिपत्र\n\
        नाम थर: राम बहादुर थापा\n\
        ठेगाना:\n\
        ललितपुर महानगरपालिका वडा नं ५\n\
        जन्म मिति: १२-०५-१९९०\n\
        रक्त समूह: ओ+\n\
        वर्ग: क, ख";
    let pipeline = pipeline(script(pass(text, 80.0), pass(text, 75.0)));

    let document = pipeline
        .process(image(), &ProgressTracker::disabled(), &CancelToken::new())
        .await
        .completed()
        .unwrap();
    let record = &document.record;

    assert_eq!(record.value(FieldName::DateOfBirth), Some("1990-05-12"));
    assert_eq!(record.value(FieldName::BloodGroup), Some("O+"));
    assert_eq!(record.value(FieldName::Category), Some("A,B"));
    assert_eq!(record.value(FieldName::Address), Some("Lalitpur Metropolitan City Ward No 5"));

    // Missing required fields surface as validation errors, not as a failed run.
    assert!(
        document
            .validation
            .field(FieldName::LicenseNumber)
            .unwrap()
            .has_error("missing required field")
    );
}
