//! Orchestration core for the deposit account opening wizard.
//!
//! The orchestrator owns the step sequence, the cursor, and the per-step
//! payload cache, and sequences validation -> persistence -> advancement
//! against externally supplied collaborators (step source, persistence,
//! prefill). Step components are mounted through a closed-enum router and
//! consumed through the [`StepComponent`] capability trait.

pub mod component;
pub mod domain;
pub mod memory;
pub mod orchestrator;
pub mod prefill;
pub mod router;
pub mod services;
pub mod session;

#[cfg(test)]
mod tests;

pub use component::{NullStep, StepComponent};
pub use domain::{
    ApplicationId, ProgressStep, StepDescriptor, StepKind, ValidationResult, WizardSignal,
};
pub use memory::{MemoryPersistence, MemorySignals, StaticPrefill, StaticStepSource};
pub use orchestrator::{AdvanceOutcome, SaveExitOutcome, WizardOrchestrator};
pub use prefill::{merge_wizard_data, ENTRY_POINT_APPLICATION_FORM};
pub use router::StepRouter;
pub use services::{
    PersistenceError, PersistenceService, PrefillError, PrefillService, SaveMessage, SavedIds,
    SignalSink, StepLoadError, StepSource, UpsertOutcome, UpsertStepRequest, WizardData,
};
pub use session::{WizardPhase, WizardSession};
