//! Collaborator contracts consumed by the resolver
use async_trait::async_trait;

use crate::data_model::{AdvisoryResult, InteractionRecord, NewInteraction, Profile, ProfileUpdate};
use crate::error::TaraError;
use crate::merge::ProfileAttributes;

/// Visa rule table keyed by (origin code, destination code)
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Requirement label, or `"unknown"` when no row matches or the table is
    /// missing. Absence is data, never an error.
    async fn lookup(&self, origin_code: &str, destination_code: &str) -> String;
}

/// Per-user profile plus an append-only interaction log
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, identity_key: &str) -> Result<Option<Profile>, TaraError>;

    /// Creates the profile when absent; otherwise writes only the present fields.
    async fn upsert(&self, identity_key: &str, update: ProfileUpdate) -> Result<(), TaraError>;

    async fn append_interaction(
        &self,
        identity_key: &str,
        interaction: NewInteraction,
    ) -> Result<(), TaraError>;

    /// Newest first
    async fn recent_interactions(
        &self,
        identity_key: &str,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, TaraError>;
}

/// Text-generation advisor. Must never receive a display name.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    async fn advise(
        &self,
        origin_country: &str,
        destination_country: &str,
        profile: &ProfileAttributes,
    ) -> Result<AdvisoryResult, TaraError>;
}
