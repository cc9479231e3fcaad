use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::WizardConfig;
use crate::wizard::component::StepComponent;
use crate::wizard::domain::{StepDescriptor, StepKind, ValidationResult};
use crate::wizard::memory::{MemoryPersistence, MemorySignals, StaticPrefill, StaticStepSource};
use crate::wizard::orchestrator::WizardOrchestrator;
use crate::wizard::router::StepRouter;

pub(super) type TestOrchestrator =
    WizardOrchestrator<StaticStepSource, MemoryPersistence, StaticPrefill>;

pub(super) struct Harness {
    pub orchestrator: TestOrchestrator,
    pub persistence: Arc<MemoryPersistence>,
    pub signals: Arc<MemorySignals>,
}

pub(super) fn build(
    config: WizardConfig,
    steps: Vec<StepDescriptor>,
    persistence: MemoryPersistence,
    prefill: StaticPrefill,
    router: StepRouter,
) -> Harness {
    build_with_source(config, StaticStepSource::new(steps), persistence, prefill, router)
}

pub(super) fn build_with_source(
    config: WizardConfig,
    source: StaticStepSource,
    persistence: MemoryPersistence,
    prefill: StaticPrefill,
    router: StepRouter,
) -> Harness {
    let persistence = Arc::new(persistence);
    let signals = Arc::new(MemorySignals::new());
    let orchestrator = WizardOrchestrator::new(
        config,
        Arc::new(source),
        persistence.clone(),
        Arc::new(prefill),
        signals.clone(),
        router,
    );
    Harness {
        orchestrator,
        persistence,
        signals,
    }
}

pub(super) fn two_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor::new("A", "Applicant Details", "applicantDetails"),
        StepDescriptor::new("B", "Review & Submit", "reviewAndSubmit"),
    ]
}

pub(super) fn three_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor::new("A", "Applicant Details", "applicantDetails"),
        StepDescriptor::new("B", "Product Selection", "productSelection"),
        StepDescriptor::new("C", "Review & Submit", "reviewAndSubmit"),
    ]
}

pub(super) fn business_wizard_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor::new("Business", "Business Details", "businessDetails"),
        StepDescriptor::new("Applicant", "Applicant Details", "applicantDetails"),
        StepDescriptor::new("Additional", "Additional Applicants", "additionalApplicants"),
        StepDescriptor::new("Products", "Product Selection", "productSelection"),
        StepDescriptor::new("Review", "Review & Submit", "reviewAndSubmit"),
    ]
}

/// Step component with a scripted validation result.
pub(super) struct ScriptedStep {
    result: ValidationResult,
    seeded: Option<Value>,
}

impl ScriptedStep {
    pub fn valid() -> Self {
        Self {
            result: ValidationResult::valid(),
            seeded: None,
        }
    }

    pub fn invalid(messages: Vec<&str>) -> Self {
        Self {
            result: ValidationResult::invalid(
                messages.into_iter().map(str::to_string).collect(),
            ),
            seeded: None,
        }
    }
}

impl StepComponent for ScriptedStep {
    fn validate(&self) -> ValidationResult {
        self.result.clone()
    }

    fn payload(&self) -> Value {
        self.seeded.clone().unwrap_or_else(|| json!({}))
    }

    fn seed(&mut self, value: Value) {
        self.seeded = Some(value);
    }
}

/// Router whose component for `kind` fails validation with `messages`.
pub(super) fn router_failing_for(kind: StepKind, messages: Vec<&'static str>) -> StepRouter {
    let mut router = StepRouter::new();
    router.register(kind, move || Box::new(ScriptedStep::invalid(messages.clone())));
    router
}
