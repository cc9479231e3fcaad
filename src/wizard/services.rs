use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{ApplicationId, StepDescriptor, WizardSignal};

/// Supplies the ordered step list configured for a named wizard.
#[async_trait]
pub trait StepSource: Send + Sync {
    async fn steps(&self, wizard_api_name: &str) -> Result<Vec<StepDescriptor>, StepLoadError>;
}

/// Step configuration lookup failure. Leaves the wizard unusable.
#[derive(Debug, thiserror::Error)]
pub enum StepLoadError {
    #[error("step configuration unavailable: {0}")]
    Unavailable(String),
    #[error("no steps configured for wizard '{0}'")]
    Empty(String),
}

/// One human-readable message attached to a persistence response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMessage {
    pub message: String,
}

/// Identifiers minted by the persistence layer during an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedIds {
    pub application_form: Option<ApplicationId>,
}

/// Structured result of a step upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub success: bool,
    pub messages: Vec<SaveMessage>,
    pub saved_ids: SavedIds,
}

impl UpsertOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            messages: Vec::new(),
            saved_ids: SavedIds::default(),
        }
    }

    pub fn success_with_id(id: ApplicationId) -> Self {
        Self {
            success: true,
            messages: Vec::new(),
            saved_ids: SavedIds {
                application_form: Some(id),
            },
        }
    }

    pub fn failure(messages: Vec<&str>) -> Self {
        Self {
            success: false,
            messages: messages
                .into_iter()
                .map(|message| SaveMessage {
                    message: message.to_string(),
                })
                .collect(),
            saved_ids: SavedIds::default(),
        }
    }

    pub fn message_text(&self) -> Vec<String> {
        self.messages.iter().map(|m| m.message.clone()).collect()
    }
}

/// Arguments for one step upsert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertStepRequest {
    pub application_id: Option<ApplicationId>,
    pub step_developer_name: String,
    pub payload: Value,
    pub context_record_id: Option<String>,
}

/// Upserts the records behind one wizard step.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn upsert_step(&self, request: UpsertStepRequest)
        -> Result<UpsertOutcome, PersistenceError>;
}

/// Unexpected (thrown) persistence fault, as opposed to a structured
/// `success: false` response.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("persistence call failed: {0}")]
    Transport(String),
}

/// Previously saved payloads for a partially completed application, keyed
/// by step category, plus resume hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WizardData {
    pub business_info: Option<Value>,
    pub applicant_info: Option<Value>,
    pub additional_applicants: Option<Value>,
    pub product_selection: Option<Value>,
    pub documents: Option<Value>,
    pub services: Option<Value>,
    pub relationship: Option<Value>,
    pub hide_business_step: bool,
    pub resume_at_step: Option<String>,
    pub entry_point_type: Option<String>,
}

/// Fetches prefill/resume data for a context record. Failures are never
/// fatal; the wizard degrades to a blank session.
#[async_trait]
pub trait PrefillService: Send + Sync {
    async fn wizard_data(
        &self,
        context_record_id: &str,
        wizard_api_name: &str,
    ) -> Result<WizardData, PrefillError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PrefillError {
    #[error("prefill lookup failed: {0}")]
    Lookup(String),
}

/// Outbound notification seam toward the hosting page or container.
pub trait SignalSink: Send + Sync {
    fn emit(&self, signal: WizardSignal);
}
