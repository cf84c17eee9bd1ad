//! Mistral chat-completions client implementing [`AdvisoryService`].
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tara_core::{AdvisoryResult, AdvisoryService, ProfileAttributes, TaraError};
use tracing::{debug, info};

use crate::parse::parse_advice;
use crate::prompt::PromptRenderer;

pub const DEFAULT_MODEL: &str = "mistral-large-latest";
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct MistralConfig {
    /// Without a key every call fails and the resolver falls back.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct MistralAdvisor {
    client: Client,
    config: MistralConfig,
    prompts: PromptRenderer,
}

impl MistralAdvisor {
    pub fn new(config: MistralConfig) -> Result<Self, TaraError> {
        Self::with_prompts(config, PromptRenderer::embedded()?)
    }

    pub fn with_prompts(config: MistralConfig, prompts: PromptRenderer) -> Result<Self, TaraError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TaraError::ConfigError(format!("http client: {}", e)))?;
        Ok(Self { client, config, prompts })
    }

    pub fn is_configured(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

fn transport(err: reqwest::Error) -> TaraError {
    TaraError::AdvisoryError(err.to_string())
}

#[async_trait]
impl AdvisoryService for MistralAdvisor {
    async fn advise(
        &self,
        origin_country: &str,
        destination_country: &str,
        profile: &ProfileAttributes,
    ) -> Result<AdvisoryResult, TaraError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(TaraError::AdvisoryError("MISTRAL_API_KEY is not set".to_string())),
        };

        let prompt = self
            .prompts
            .render_advice(origin_country, destination_country, profile)?;
        debug!(chars = prompt.len(), "Advisory prompt rendered");

        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "response_format": { "type": "json_object" },
        });

        let response: ChatResponse = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TaraError::AdvisoryError("reply has no message content".to_string()))?;

        let advice = parse_advice(&content)?;
        info!(
            origin = origin_country,
            destination = destination_country,
            outstanding = advice.outstanding_fields.len(),
            "Advisory received"
        );
        Ok(advice)
    }
}
