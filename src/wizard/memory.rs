//! In-memory collaborator implementations for hosts and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::domain::{StepDescriptor, WizardSignal};
use super::services::{
    PersistenceError, PersistenceService, PrefillError, PrefillService, SignalSink, StepLoadError,
    StepSource, UpsertOutcome, UpsertStepRequest, WizardData,
};

/// Step source backed by a fixed step list.
pub struct StaticStepSource {
    steps: Vec<StepDescriptor>,
    failure: Option<String>,
}

impl StaticStepSource {
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        Self {
            steps,
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            steps: Vec::new(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl StepSource for StaticStepSource {
    async fn steps(&self, wizard_api_name: &str) -> Result<Vec<StepDescriptor>, StepLoadError> {
        if let Some(message) = &self.failure {
            return Err(StepLoadError::Unavailable(message.clone()));
        }
        if self.steps.is_empty() {
            return Err(StepLoadError::Empty(wizard_api_name.to_string()));
        }
        Ok(self.steps.clone())
    }
}

/// Persistence fake with scripted outcomes and a call log.
///
/// Outcomes are consumed front to back; once the script is exhausted every
/// call succeeds without minting an identifier. An optional gate parks each
/// call until the test notifies it, which is how in-flight re-entry is
/// exercised.
#[derive(Default)]
pub struct MemoryPersistence {
    outcomes: Mutex<VecDeque<Result<UpsertOutcome, PersistenceError>>>,
    calls: Mutex<Vec<UpsertStepRequest>>,
    gate: Option<Arc<Notify>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outcomes(outcomes: Vec<Result<UpsertOutcome, PersistenceError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<UpsertStepRequest> {
        self.calls.lock().expect("call log lock").clone()
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistence {
    async fn upsert_step(
        &self,
        request: UpsertStepRequest,
    ) -> Result<UpsertOutcome, PersistenceError> {
        self.calls.lock().expect("call log lock").push(request);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let scripted = self.outcomes.lock().expect("outcome lock").pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => Ok(UpsertOutcome::success()),
        }
    }
}

/// Prefill fake returning a fixed `WizardData` or a scripted failure.
#[derive(Default)]
pub struct StaticPrefill {
    data: WizardData,
    failure: Option<String>,
}

impl StaticPrefill {
    pub fn with(data: WizardData) -> Self {
        Self {
            data,
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            data: WizardData::default(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl PrefillService for StaticPrefill {
    async fn wizard_data(
        &self,
        _context_record_id: &str,
        _wizard_api_name: &str,
    ) -> Result<WizardData, PrefillError> {
        match &self.failure {
            Some(message) => Err(PrefillError::Lookup(message.clone())),
            None => Ok(self.data.clone()),
        }
    }
}

/// Signal sink that records every emitted signal.
#[derive(Default)]
pub struct MemorySignals {
    events: Mutex<Vec<WizardSignal>>,
}

impl MemorySignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WizardSignal> {
        self.events.lock().expect("signal log lock").clone()
    }
}

impl SignalSink for MemorySignals {
    fn emit(&self, signal: WizardSignal) {
        self.events.lock().expect("signal log lock").push(signal);
    }
}
