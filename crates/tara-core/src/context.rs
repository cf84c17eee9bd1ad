//! Request Context: per-request state shared by the pipeline steps
use chrono::{DateTime, Utc};

use crate::data_model::SuppliedProfile;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub trace_id: String,
    /// User id, falling back to email. `None` means stateless resolution.
    pub identity_key: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(identity_key: Option<String>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            identity_key,
            received_at: Utc::now(),
        }
    }

    pub fn for_profile(profile: &SuppliedProfile) -> Self {
        Self::new(profile.identity_key())
    }

    pub fn is_stateless(&self) -> bool {
        self.identity_key.is_none()
    }
}
