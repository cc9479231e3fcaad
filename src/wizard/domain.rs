use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier wrapper for the application form record backing a wizard run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// One configured step of the wizard, ordered by position in the step list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub developer_name: String,
    pub step_label: String,
    pub component_bundle: String,
}

impl StepDescriptor {
    pub fn new(
        developer_name: impl Into<String>,
        step_label: impl Into<String>,
        component_bundle: impl Into<String>,
    ) -> Self {
        Self {
            developer_name: developer_name.into(),
            step_label: step_label.into(),
            component_bundle: component_bundle.into(),
        }
    }

    /// Resolved component kind, or `None` for bundles outside the catalog.
    pub fn kind(&self) -> Option<StepKind> {
        StepKind::from_bundle(&self.component_bundle)
    }
}

/// Closed catalog of step component bundles the router knows how to mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    ApplicantDetails,
    BusinessDetails,
    AdditionalApplicants,
    ProductSelection,
    AdditionalServices,
    DocumentUpload,
    ReviewAndSubmit,
    RelationshipAssignment,
}

impl StepKind {
    pub fn from_bundle(bundle: &str) -> Option<Self> {
        match bundle {
            "applicantDetails" => Some(Self::ApplicantDetails),
            "businessDetails" => Some(Self::BusinessDetails),
            "additionalApplicants" => Some(Self::AdditionalApplicants),
            "productSelection" => Some(Self::ProductSelection),
            "additionalServices" => Some(Self::AdditionalServices),
            "documentUpload" => Some(Self::DocumentUpload),
            "reviewAndSubmit" => Some(Self::ReviewAndSubmit),
            "relationshipAssignment" => Some(Self::RelationshipAssignment),
            _ => None,
        }
    }

    pub fn bundle(&self) -> &'static str {
        match self {
            Self::ApplicantDetails => "applicantDetails",
            Self::BusinessDetails => "businessDetails",
            Self::AdditionalApplicants => "additionalApplicants",
            Self::ProductSelection => "productSelection",
            Self::AdditionalServices => "additionalServices",
            Self::DocumentUpload => "documentUpload",
            Self::ReviewAndSubmit => "reviewAndSubmit",
            Self::RelationshipAssignment => "relationshipAssignment",
        }
    }
}

/// Outcome of asking the active step component to validate its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub messages: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            messages: Vec::new(),
        }
    }

    pub fn invalid(messages: Vec<String>) -> Self {
        Self {
            is_valid: false,
            messages,
        }
    }
}

/// Entry for the progress indicator rendered alongside the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    pub developer_name: String,
    pub step_label: String,
    pub step_number: usize,
    pub is_active: bool,
    pub is_completed: bool,
}

/// Notifications the orchestrator emits toward its hosting container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WizardSignal {
    Completed {
        application_id: Option<ApplicationId>,
        final_payload: Value,
        emitted_at: DateTime<Utc>,
    },
    SaveAndExit {
        application_id: Option<ApplicationId>,
        current_step: Option<String>,
        current_payload: Value,
        all_payloads: Value,
        emitted_at: DateTime<Utc>,
    },
    ValidationError {
        messages: Vec<String>,
        emitted_at: DateTime<Utc>,
    },
    SaveError {
        messages: Vec<String>,
        emitted_at: DateTime<Utc>,
    },
    Warning {
        message: String,
        emitted_at: DateTime<Utc>,
    },
}

impl WizardSignal {
    pub fn completed(application_id: Option<ApplicationId>, final_payload: Value) -> Self {
        Self::Completed {
            application_id,
            final_payload,
            emitted_at: Utc::now(),
        }
    }

    pub fn save_and_exit(
        application_id: Option<ApplicationId>,
        current_step: Option<String>,
        current_payload: Value,
        all_payloads: Value,
    ) -> Self {
        Self::SaveAndExit {
            application_id,
            current_step,
            current_payload,
            all_payloads,
            emitted_at: Utc::now(),
        }
    }

    pub fn validation_error(messages: Vec<String>) -> Self {
        Self::ValidationError {
            messages,
            emitted_at: Utc::now(),
        }
    }

    pub fn save_error(messages: Vec<String>) -> Self {
        Self::SaveError {
            messages,
            emitted_at: Utc::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
            emitted_at: Utc::now(),
        }
    }
}
