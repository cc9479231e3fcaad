use std::sync::Arc;

use serde_json::json;
use tokio::sync::Notify;

use super::common::{
    build, build_with_source, business_wizard_steps, router_failing_for, two_steps,
};
use crate::config::WizardConfig;
use crate::error::WizardAppError;
use crate::wizard::domain::{ApplicationId, StepKind, WizardSignal};
use crate::wizard::memory::{MemoryPersistence, MemorySignals, StaticPrefill, StaticStepSource};
use crate::wizard::orchestrator::{AdvanceOutcome, SaveExitOutcome, WizardOrchestrator};
use crate::wizard::router::StepRouter;
use crate::wizard::services::{PersistenceError, UpsertOutcome, WizardData};
use crate::wizard::session::WizardPhase;

#[tokio::test]
async fn advance_blocks_on_validation_failure_without_persisting() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        router_failing_for(StepKind::ApplicantDetails, vec!["First Name is required."]),
    );
    harness.orchestrator.initialize().await.expect("init");

    let outcome = harness.orchestrator.advance().await;

    assert_eq!(
        outcome,
        AdvanceOutcome::ValidationFailed(vec!["First Name is required.".to_string()])
    );
    assert_eq!(harness.orchestrator.current_index(), 0);
    assert!(harness.persistence.calls().is_empty(), "no persistence call on invalid step");
    assert!(matches!(
        harness.signals.events().as_slice(),
        [WizardSignal::ValidationError { messages, .. }] if messages == &["First Name is required.".to_string()]
    ));
}

#[tokio::test]
async fn debug_mode_logs_validation_failures_and_advances_anyway() {
    let harness = build(
        WizardConfig::debug(),
        two_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        router_failing_for(StepKind::ApplicantDetails, vec!["First Name is required."]),
    );
    harness.orchestrator.initialize().await.expect("init");

    let outcome = harness.orchestrator.advance().await;

    assert_eq!(outcome, AdvanceOutcome::Advanced);
    assert_eq!(harness.orchestrator.current_index(), 1);
    assert_eq!(harness.persistence.calls().len(), 1);
}

#[tokio::test]
async fn application_id_is_monotonic_across_saves() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::with_outcomes(vec![
            Ok(UpsertOutcome::success_with_id(ApplicationId("X1".to_string()))),
            Ok(UpsertOutcome::success_with_id(ApplicationId("X2".to_string()))),
        ]),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    harness.orchestrator.record_payload_change(json!({"firstName": "Jane"}));
    assert_eq!(harness.orchestrator.advance().await, AdvanceOutcome::Advanced);
    assert_eq!(
        harness.orchestrator.application_id(),
        Some(ApplicationId("X1".to_string()))
    );

    assert_eq!(harness.orchestrator.advance().await, AdvanceOutcome::Completed);
    assert_eq!(
        harness.orchestrator.application_id(),
        Some(ApplicationId("X1".to_string())),
        "a later minted id never replaces the adopted one"
    );

    // The second call carries the adopted id instead of the context record.
    let calls = harness.persistence.calls();
    assert_eq!(calls[0].application_id, None);
    assert_eq!(calls[1].application_id, Some(ApplicationId("X1".to_string())));
}

#[tokio::test]
async fn structured_save_failure_blocks_advancement() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::with_outcomes(vec![Ok(UpsertOutcome::failure(vec![
            "Name is required on the application form",
        ]))]),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    let outcome = harness.orchestrator.advance().await;

    assert!(matches!(outcome, AdvanceOutcome::SaveFailed(_)));
    assert_eq!(harness.orchestrator.current_index(), 0);
    assert!(matches!(
        harness.signals.events().as_slice(),
        [WizardSignal::SaveError { .. }]
    ));
}

#[tokio::test]
async fn thrown_persistence_fault_is_fatal_for_the_operation() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::with_outcomes(vec![Err(PersistenceError::Transport(
            "socket closed".to_string(),
        ))]),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    let outcome = harness.orchestrator.advance().await;

    assert!(matches!(outcome, AdvanceOutcome::Failed(_)));
    assert_eq!(harness.orchestrator.current_index(), 0);
    assert!(matches!(
        harness.signals.events().as_slice(),
        [WizardSignal::SaveError { .. }]
    ));
}

#[tokio::test]
async fn debug_mode_swallows_thrown_persistence_faults() {
    let harness = build(
        WizardConfig::debug(),
        two_steps(),
        MemoryPersistence::with_outcomes(vec![Err(PersistenceError::Transport(
            "socket closed".to_string(),
        ))]),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    assert_eq!(harness.orchestrator.advance().await, AdvanceOutcome::Advanced);
    assert_eq!(harness.orchestrator.current_index(), 1);
}

#[tokio::test]
async fn debug_mode_substitutes_a_sentinel_for_skipped_steps() {
    let harness = build(
        WizardConfig::debug(),
        two_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    // No payload was ever recorded for step A.
    harness.orchestrator.advance().await;

    let calls = harness.persistence.calls();
    assert_eq!(calls[0].payload, json!({"debugSkip": true}));
}

#[tokio::test]
async fn in_flight_advance_rejects_reentry() {
    let gate = Arc::new(Notify::new());
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::gated(gate.clone()),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");
    harness.orchestrator.record_payload_change(json!({"firstName": "Jane"}));

    let (first, second) = tokio::join!(harness.orchestrator.advance(), async {
        tokio::task::yield_now().await;
        let second = harness.orchestrator.advance().await;
        gate.notify_one();
        second
    });

    assert_eq!(first, AdvanceOutcome::Advanced);
    assert_eq!(second, AdvanceOutcome::Busy);
    assert_eq!(harness.persistence.calls().len(), 1, "exactly one upsert issued");
}

#[tokio::test]
async fn retreat_needs_no_validation_and_stops_at_zero() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        // Even an invalid current step never blocks going back.
        router_failing_for(StepKind::ReviewAndSubmit, vec!["incomplete"]),
    );
    harness.orchestrator.initialize().await.expect("init");
    harness.orchestrator.advance().await;
    assert_eq!(harness.orchestrator.current_index(), 1);

    assert!(harness.orchestrator.retreat());
    assert_eq!(harness.orchestrator.current_index(), 0);
    assert!(!harness.orchestrator.retreat());
    assert_eq!(harness.persistence.calls().len(), 1, "retreat never persists");
}

#[tokio::test]
async fn jump_is_a_debug_only_affordance() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    assert!(!harness.orchestrator.jump(1));
    assert_eq!(harness.orchestrator.current_index(), 0);

    let debug = build(
        WizardConfig::debug(),
        two_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    debug.orchestrator.initialize().await.expect("init");
    assert!(debug.orchestrator.jump(1));
    assert_eq!(debug.orchestrator.current_index(), 1);
    assert!(debug.orchestrator.jump(99));
    assert_eq!(debug.orchestrator.current_index(), 1, "jump clamps into bounds");
    assert!(debug.persistence.calls().is_empty());
}

#[tokio::test]
async fn payload_cache_is_last_write_wins_per_step() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    harness.orchestrator.record_payload_change(json!({"firstName": "Jane"}));
    harness.orchestrator.record_payload_change(json!({"firstName": "Joan"}));

    assert_eq!(
        harness.orchestrator.current_step_value(),
        Some(json!({"firstName": "Joan"}))
    );
    assert_eq!(harness.orchestrator.payload_snapshot()["A"], json!({"firstName": "Joan"}));
}

#[tokio::test]
async fn additional_applicants_payload_carries_the_primary_applicant() {
    let harness = build(
        WizardConfig::debug(),
        business_wizard_steps(),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    harness.orchestrator.jump(1); // Applicant Details
    harness.orchestrator.record_payload_change(json!({"firstName": "Jane"}));

    harness.orchestrator.jump(2); // Additional Applicants
    harness.orchestrator.record_payload_change(json!({"applicants": []}));

    let cached = harness.orchestrator.current_step_value().expect("cached");
    assert_eq!(
        cached,
        json!({"applicants": [], "primaryApplicant": {"firstName": "Jane"}})
    );
}

#[tokio::test]
async fn save_and_exit_persists_without_validation_and_signals() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::with_outcomes(vec![Ok(UpsertOutcome::success_with_id(
            ApplicationId("X9".to_string()),
        ))]),
        StaticPrefill::default(),
        // Invalid step; save-and-exit has no validation gate.
        router_failing_for(StepKind::ApplicantDetails, vec!["incomplete"]),
    );
    harness.orchestrator.initialize().await.expect("init");
    harness.orchestrator.record_payload_change(json!({"firstName": "Ja"}));

    let outcome = harness.orchestrator.save_and_exit().await;

    assert_eq!(outcome, SaveExitOutcome::Saved);
    assert_eq!(harness.orchestrator.current_index(), 0, "cursor unchanged");
    assert_eq!(
        harness.orchestrator.application_id(),
        Some(ApplicationId("X9".to_string()))
    );
    let events = harness.signals.events();
    assert!(matches!(
        events.last(),
        Some(WizardSignal::SaveAndExit { current_step: Some(step), .. }) if step == "A"
    ));
}

#[tokio::test]
async fn save_and_exit_failure_blocks_the_exit_signal_outside_debug_mode() {
    let harness = build(
        WizardConfig::standard(),
        two_steps(),
        MemoryPersistence::with_outcomes(vec![Ok(UpsertOutcome::failure(vec!["storage full"]))]),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    let outcome = harness.orchestrator.save_and_exit().await;

    assert!(matches!(outcome, SaveExitOutcome::SaveFailed(_)));
    assert!(matches!(
        harness.signals.events().as_slice(),
        [WizardSignal::SaveError { .. }]
    ));
}

#[tokio::test]
async fn save_and_exit_failure_still_exits_in_debug_mode() {
    let harness = build(
        WizardConfig::debug(),
        two_steps(),
        MemoryPersistence::with_outcomes(vec![Ok(UpsertOutcome::failure(vec!["storage full"]))]),
        StaticPrefill::default(),
        StepRouter::new(),
    );
    harness.orchestrator.initialize().await.expect("init");

    let outcome = harness.orchestrator.save_and_exit().await;

    assert_eq!(outcome, SaveExitOutcome::Saved);
    let events = harness.signals.events();
    assert!(matches!(events.first(), Some(WizardSignal::SaveError { .. })));
    assert!(matches!(events.last(), Some(WizardSignal::SaveAndExit { .. })));
}

#[tokio::test]
async fn failed_step_load_leaves_the_wizard_unusable() {
    let harness = build_with_source(
        WizardConfig::standard(),
        StaticStepSource::failing("config service down"),
        MemoryPersistence::new(),
        StaticPrefill::default(),
        StepRouter::new(),
    );

    let err = harness.orchestrator.initialize().await.expect_err("load fails");
    assert!(matches!(err, WizardAppError::StepLoad(_)));
    assert_eq!(harness.orchestrator.phase(), WizardPhase::Initializing);
    assert!(matches!(
        harness.signals.events().as_slice(),
        [WizardSignal::Warning { .. }]
    ));

    // Navigation stays a guarded no-op.
    assert_eq!(harness.orchestrator.advance().await, AdvanceOutcome::NotReady);
    assert!(!harness.orchestrator.retreat());
}

#[tokio::test]
async fn prefill_failure_degrades_to_a_blank_session() {
    let signals = Arc::new(MemorySignals::new());
    let orchestrator = WizardOrchestrator::new(
        WizardConfig::standard(),
        Arc::new(StaticStepSource::new(two_steps())),
        Arc::new(MemoryPersistence::new()),
        Arc::new(StaticPrefill::failing("context record unreadable")),
        signals.clone(),
        StepRouter::new(),
    )
    .with_context_record("ctx-001");

    orchestrator.initialize().await.expect("init succeeds anyway");

    assert_eq!(orchestrator.phase(), WizardPhase::Active);
    assert_eq!(orchestrator.current_index(), 0);
    assert_eq!(orchestrator.payload_snapshot(), json!({}));
    assert!(matches!(
        signals.events().as_slice(),
        [WizardSignal::Warning { .. }]
    ));
}

#[tokio::test]
async fn prefill_resume_applies_during_initialization() {
    let prefill = StaticPrefill::with(WizardData {
        applicant_info: Some(json!({"firstName": "Jane"})),
        resume_at_step: Some("B".to_string()),
        entry_point_type: Some("ApplicationForm".to_string()),
        ..WizardData::default()
    });
    let orchestrator = WizardOrchestrator::new(
        WizardConfig::standard(),
        Arc::new(StaticStepSource::new(two_steps())),
        Arc::new(MemoryPersistence::new()),
        Arc::new(prefill),
        Arc::new(MemorySignals::new()),
        StepRouter::new(),
    )
    .with_context_record("ctx-002");

    orchestrator.initialize().await.expect("init");

    assert_eq!(orchestrator.current_index(), 1);
    assert_eq!(
        orchestrator.payload_snapshot()["A"],
        json!({"firstName": "Jane"})
    );
}
