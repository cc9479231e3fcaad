//! Resume/prefill merge: seeds the payload cache from previously saved
//! application data and resolves the resume position.

use serde_json::{json, Value};

use super::domain::StepKind;
use super::services::WizardData;
use super::session::WizardSession;

/// Entry context marking a previously started application, the only context
/// in which a resume point is honored.
pub const ENTRY_POINT_APPLICATION_FORM: &str = "ApplicationForm";

/// Merge fetched wizard data into the session.
///
/// Seeds each present category under the matching step's developer name,
/// always seeds the additional-applicants wrapper, removes the business step
/// when the context hides it, and moves the cursor to the resume step when
/// one applies. Unknown resume steps are ignored and the session stays at
/// the first step.
pub fn merge_wizard_data(session: &mut WizardSession, data: WizardData) {
    let categories = [
        (StepKind::BusinessDetails, data.business_info),
        (StepKind::ApplicantDetails, data.applicant_info),
        (StepKind::ProductSelection, data.product_selection),
        (StepKind::DocumentUpload, data.documents),
        (StepKind::AdditionalServices, data.services),
        (StepKind::RelationshipAssignment, data.relationship),
    ];

    for (kind, value) in categories {
        let Some(value) = value else { continue };
        if let Some(step) = session.step_of_kind(kind) {
            let developer_name = step.developer_name.clone();
            session.cache_payload(developer_name, value);
        }
    }

    // Always seeded, even when the response carried no applicants.
    if let Some(step) = session.step_of_kind(StepKind::AdditionalApplicants) {
        let developer_name = step.developer_name.clone();
        let applicants = data.additional_applicants.unwrap_or_else(|| json!([]));
        let primary = session.primary_applicant_payload().unwrap_or(Value::Null);
        session.cache_payload(
            developer_name,
            json!({ "applicants": applicants, "primaryApplicant": primary }),
        );
    }

    if data.hide_business_step {
        if let Some(step) = session.step_of_kind(StepKind::BusinessDetails) {
            let developer_name = step.developer_name.clone();
            session.remove_step(&developer_name);
            tracing::debug!(step = %developer_name, "business step hidden for this context");
        }
    }

    let resuming_application = data.entry_point_type.as_deref() == Some(ENTRY_POINT_APPLICATION_FORM);
    if resuming_application {
        if let Some(resume_at) = data.resume_at_step.as_deref() {
            match session.position_of(resume_at) {
                Some(position) => session.set_index(position),
                None => {
                    tracing::debug!(step = %resume_at, "resume step not found, starting at first step");
                }
            }
        }
    }
}
