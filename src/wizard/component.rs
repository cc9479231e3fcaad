use serde_json::{json, Value};

use super::domain::ValidationResult;

/// Capability surface every mountable step component exposes to the wizard.
pub trait StepComponent: Send {
    /// Check the component's current field values.
    fn validate(&self) -> ValidationResult;

    /// Snapshot of the component's current field values.
    fn payload(&self) -> Value;

    /// Seed the component from a previously cached payload.
    fn seed(&mut self, value: Value);
}

/// Placeholder mounted when a step has no registered component. Always
/// validates clean with an empty payload, so an unconfigured bundle never
/// blocks navigation.
#[derive(Debug, Default)]
pub struct NullStep;

impl StepComponent for NullStep {
    fn validate(&self) -> ValidationResult {
        ValidationResult::valid()
    }

    fn payload(&self) -> Value {
        json!({})
    }

    fn seed(&mut self, _value: Value) {}
}
