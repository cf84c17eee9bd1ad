//! Response shape consumed by the frontend
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data_model::{IncompleteReason, ResolutionStatus, ResolvedRequest};
use crate::guidance::{
    procedural_steps, required_documents, ProceduralStep, TravelPurpose, VisaRequirement,
};

pub const DATA_SOURCE: &str = "Hybrid (DB + Mistral AI)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceResponse {
    pub status: ResolutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<IncompleteReason>,
    pub message: String,
    pub visa_requirement: Option<String>,
    pub origin: Option<String>,
    pub destination: String,
    pub purpose: String,
    pub forms: Vec<String>,
    pub health: Vec<String>,
    pub safety: Vec<String>,
    pub awaiting_feedback: BTreeMap<String, String>,
    pub needs_more_info: bool,
    pub documents: Vec<String>,
    pub steps: Vec<ProceduralStep>,
    pub user_has_stored_profile: bool,
    pub citizenship_was_stored: bool,
    pub data_source: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl GuidanceResponse {
    pub fn from_resolved(resolved: &ResolvedRequest) -> Self {
        let (forms, health, safety) = match &resolved.advisory {
            Some(advisory) => (
                advisory.forms.clone(),
                advisory.health.clone(),
                advisory.safety.clone(),
            ),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        // Guidance only exists once a rule label was looked up.
        let (documents, steps) = match (&resolved.visa_requirement, &resolved.origin_country) {
            (Some(label), Some(origin)) if resolved.status != ResolutionStatus::Error => {
                let requirement = VisaRequirement::classify(label);
                let purpose = TravelPurpose::classify(&resolved.purpose);
                (
                    required_documents(requirement, &resolved.destination_country, purpose, origin),
                    procedural_steps(requirement, &resolved.destination_country, purpose),
                )
            }
            _ => (Vec::new(), Vec::new()),
        };

        Self {
            status: resolved.status,
            reason: resolved.reason,
            message: message_for(resolved),
            visa_requirement: resolved.visa_requirement.clone(),
            origin: resolved.origin_country.clone(),
            destination: resolved.destination_country.clone(),
            purpose: resolved.purpose.clone(),
            forms,
            health,
            safety,
            awaiting_feedback: resolved.outstanding_fields.clone(),
            needs_more_info: resolved.needs_more_info(),
            documents,
            steps,
            user_has_stored_profile: resolved.user_has_stored_profile,
            citizenship_was_stored: resolved.citizenship_was_stored,
            data_source: DATA_SOURCE.to_string(),
            trace_id: resolved.trace_id.clone(),
            error_details: resolved.error.clone(),
        }
    }
}

fn message_for(resolved: &ResolvedRequest) -> String {
    match (resolved.status, resolved.reason) {
        (ResolutionStatus::Complete, _) => {
            "Complete travel guidance generated successfully.".to_string()
        }
        (ResolutionStatus::Incomplete, Some(IncompleteReason::MissingIdentity)) => {
            "Please provide your citizenship/nationality to proceed".to_string()
        }
        (ResolutionStatus::Incomplete, _) => {
            "Additional information required to provide complete guidance.".to_string()
        }
        (ResolutionStatus::Error, _) => format!(
            "Unable to process request: {}",
            resolved.error.as_deref().unwrap_or("unexpected failure")
        ),
    }
}
