use std::collections::HashMap;

use serde_json::{Map, Value};

use super::domain::{ApplicationId, ProgressStep, StepDescriptor, StepKind};

/// Lifecycle of one wizard run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    /// Steps not yet loaded, or prefill still in flight. Navigation is a
    /// guarded no-op.
    Initializing,
    Active,
    /// Terminal; reached after a successful persist on the last step.
    Completed,
}

/// Owned state of one wizard run: the step list, cursor, payload cache, and
/// the adopted application identifier. Mutated only through the
/// orchestrator's operations.
#[derive(Debug)]
pub struct WizardSession {
    steps: Vec<StepDescriptor>,
    current_index: usize,
    payload_by_step: HashMap<String, Value>,
    application_id: Option<ApplicationId>,
    phase: WizardPhase,
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            current_index: 0,
            payload_by_step: HashMap::new(),
            application_id: None,
            phase: WizardPhase::Initializing,
        }
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    pub fn activate(&mut self) {
        if !self.steps.is_empty() {
            self.phase = WizardPhase::Active;
        }
    }

    pub fn complete(&mut self) {
        self.phase = WizardPhase::Completed;
    }

    pub fn set_steps(&mut self, steps: Vec<StepDescriptor>) {
        self.steps = steps;
        self.clamp_index();
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_step(&self) -> Option<&StepDescriptor> {
        self.steps.get(self.current_index)
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        !self.steps.is_empty() && self.current_index == self.steps.len() - 1
    }

    /// Direct cursor set, clamped into bounds.
    pub fn set_index(&mut self, index: usize) {
        self.current_index = index;
        self.clamp_index();
    }

    pub fn advance_index(&mut self) {
        if self.current_index + 1 < self.steps.len() {
            self.current_index += 1;
        }
    }

    /// Returns false when already on the first step.
    pub fn retreat_index(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    fn clamp_index(&mut self) {
        let upper = self.steps.len().saturating_sub(1);
        if self.current_index > upper {
            self.current_index = upper;
        }
    }

    pub fn position_of(&self, developer_name: &str) -> Option<usize> {
        self.steps
            .iter()
            .position(|step| step.developer_name == developer_name)
    }

    pub fn step_of_kind(&self, kind: StepKind) -> Option<&StepDescriptor> {
        self.steps.iter().find(|step| step.kind() == Some(kind))
    }

    /// Drop a step from the active sequence along with any cached payload,
    /// re-clamping the cursor.
    pub fn remove_step(&mut self, developer_name: &str) {
        self.steps.retain(|step| step.developer_name != developer_name);
        self.payload_by_step.remove(developer_name);
        self.clamp_index();
    }

    /// Last-write-wins payload cache write.
    pub fn cache_payload(&mut self, developer_name: impl Into<String>, payload: Value) {
        self.payload_by_step.insert(developer_name.into(), payload);
    }

    pub fn payload_for(&self, developer_name: &str) -> Option<&Value> {
        self.payload_by_step.get(developer_name)
    }

    /// Cached payload of the current step, with the primary-applicant
    /// injection applied for additional-applicants steps.
    pub fn current_step_value(&self) -> Option<Value> {
        let step = self.current_step()?;
        let mut value = self.payload_by_step.get(&step.developer_name).cloned()?;
        if step.kind() == Some(StepKind::AdditionalApplicants) {
            self.inject_primary_applicant(&mut value);
        }
        Some(value)
    }

    /// Latest cached payload of the designated primary-applicant step.
    pub fn primary_applicant_payload(&self) -> Option<Value> {
        let primary = self.step_of_kind(StepKind::ApplicantDetails)?;
        self.payload_by_step.get(&primary.developer_name).cloned()
    }

    /// Augment an additional-applicants payload with the primary applicant
    /// so dependent UI needs no second round-trip.
    pub fn inject_primary_applicant(&self, value: &mut Value) {
        if let Value::Object(map) = value {
            let primary = self.primary_applicant_payload().unwrap_or(Value::Null);
            map.insert("primaryApplicant".to_string(), primary);
        }
    }

    /// Adopt a newly minted application identifier. Once held, the
    /// identifier is never cleared or replaced.
    pub fn adopt_application_id(&mut self, id: ApplicationId) {
        if id.is_blank() || self.application_id.is_some() {
            return;
        }
        self.application_id = Some(id);
    }

    pub fn application_id(&self) -> Option<&ApplicationId> {
        self.application_id.as_ref()
    }

    /// Full payload map as a JSON object keyed by developer name.
    pub fn payload_snapshot(&self) -> Value {
        let mut map = Map::new();
        for (developer_name, payload) in &self.payload_by_step {
            map.insert(developer_name.clone(), payload.clone());
        }
        Value::Object(map)
    }

    pub fn progress_steps(&self) -> Vec<ProgressStep> {
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| ProgressStep {
                developer_name: step.developer_name.clone(),
                step_label: step.step_label.clone(),
                step_number: index + 1,
                is_active: index == self.current_index,
                is_completed: index < self.current_index,
            })
            .collect()
    }

    pub fn next_button_label(&self) -> &'static str {
        if self.is_last() {
            "Complete"
        } else {
            "Next"
        }
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}
