//! Server configuration from environment variables
use std::time::Duration;
use tara_advisory::MistralConfig;
use tara_core::TaraError;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DB_PATH: &str = "tara_migration.db";
/// Selects the in-memory stores instead of SQLite.
pub const MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct TaraConfig {
    pub addr: String,
    pub db_path: String,
    pub mistral: MistralConfig,
    /// YAML prompt templates replacing the embedded ones
    pub prompts_path: Option<String>,
}

impl TaraConfig {
    pub fn from_env() -> Result<Self, TaraError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, TaraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = MistralConfig::default();

        let timeout = match var("TARA_ADVISORY_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    TaraError::ConfigError(format!(
                        "TARA_ADVISORY_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            addr: var("TARA_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            db_path: var("TARA_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            mistral: MistralConfig {
                api_key: var("MISTRAL_API_KEY"),
                model: var("MISTRAL_MODEL").unwrap_or(defaults.model),
                base_url: var("MISTRAL_BASE_URL").unwrap_or(defaults.base_url),
                timeout,
            },
            prompts_path: var("TARA_PROMPTS_PATH"),
        })
    }

    pub fn uses_memory_stores(&self) -> bool {
        self.db_path == MEMORY_DB
    }
}
