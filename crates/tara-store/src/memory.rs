//! In-memory stores
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tara_core::data_model::UNKNOWN_REQUIREMENT;
use tara_core::{
    InteractionRecord, NewInteraction, Profile, ProfileStore, ProfileUpdate, RuleStore, TaraError,
};
use tokio::sync::RwLock;

/// Fixed rule table
#[derive(Debug, Default)]
pub struct StaticRuleStore {
    rules: HashMap<(String, String), String>,
}

impl StaticRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, origin: &str, dest: &str, rule: &str) -> Self {
        self.rules
            .insert((origin.to_string(), dest.to_string()), rule.to_string());
        self
    }
}

#[async_trait]
impl RuleStore for StaticRuleStore {
    async fn lookup(&self, origin_code: &str, destination_code: &str) -> String {
        self.rules
            .get(&(origin_code.to_string(), destination_code.to_string()))
            .cloned()
            .unwrap_or_else(|| UNKNOWN_REQUIREMENT.to_string())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
    interactions: RwLock<Vec<InteractionRecord>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, identity_key: &str) -> Result<Option<Profile>, TaraError> {
        Ok(self.profiles.read().await.get(identity_key.trim()).cloned())
    }

    async fn upsert(&self, identity_key: &str, update: ProfileUpdate) -> Result<(), TaraError> {
        let key = identity_key.trim();
        if key.is_empty() {
            return Err(TaraError::InputError("identity key must not be blank".to_string()));
        }
        self.profiles
            .write()
            .await
            .entry(key.to_string())
            .or_insert_with(|| Profile::new(key))
            .apply_update(&update);
        Ok(())
    }

    async fn append_interaction(
        &self,
        identity_key: &str,
        interaction: NewInteraction,
    ) -> Result<(), TaraError> {
        let key = identity_key.trim();
        if key.is_empty() {
            return Err(TaraError::InputError("identity key must not be blank".to_string()));
        }
        let mut interactions = self.interactions.write().await;
        let id = interactions.len() as i64 + 1;
        interactions.push(InteractionRecord {
            id,
            user_id: key.to_string(),
            request_type: interaction.request_type,
            origin: interaction.origin,
            destination: interaction.destination,
            purpose: interaction.purpose,
            status: interaction.status.as_str().to_string(),
            advisory_payload: interaction.advisory_payload,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_interactions(
        &self,
        identity_key: &str,
        limit: usize,
    ) -> Result<Vec<InteractionRecord>, TaraError> {
        let key = identity_key.trim();
        Ok(self
            .interactions
            .read()
            .await
            .iter()
            .rev()
            .filter(|record| record.user_id == key)
            .take(limit)
            .cloned()
            .collect())
    }
}
