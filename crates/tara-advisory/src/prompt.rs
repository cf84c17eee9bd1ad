//! Prompt templates for the advisory call.
//!
//! Templates live in a YAML file with Handlebars bodies:
//!
//! ```yaml
//! version: "1.0"
//! templates:
//!   expert_advice:
//!     description: ...
//!     template: "Analyze travel from {{origin}} to {{destination}} ..."
//! ```
//!
//! The default file is embedded at compile time; a path can override it.

use handlebars::Handlebars;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tara_core::{ProfileAttributes, TaraError};

pub const EXPERT_ADVICE: &str = "expert_advice";

static DEFAULT_TEMPLATES: &str = include_str!("../templates/advisory-prompts.yaml");

static DEFAULT_FILE: Lazy<Result<PromptTemplates, String>> =
    Lazy::new(|| PromptTemplates::from_yaml(DEFAULT_TEMPLATES));

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplates {
    pub version: String,
    pub templates: HashMap<String, PromptTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    pub description: String,
    pub template: String,
    #[serde(default)]
    pub example: Option<Value>,
}

impl PromptTemplates {
    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read templates file: {}", e))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse templates YAML: {}", e))
    }

    pub fn embedded() -> Result<Self, String> {
        DEFAULT_FILE.clone()
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }
}

/// Compiled templates. Output is plain text, so HTML escaping is disabled.
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl PromptRenderer {
    pub fn new(templates: &PromptTemplates) -> Result<Self, TaraError> {
        if templates.get(EXPERT_ADVICE).is_none() {
            return Err(TaraError::ConfigError(format!(
                "prompt templates are missing '{}'",
                EXPERT_ADVICE
            )));
        }

        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);
        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| TaraError::ConfigError(format!("template '{}': {}", name, e)))?;
        }
        Ok(Self { handlebars })
    }

    pub fn embedded() -> Result<Self, TaraError> {
        let templates = PromptTemplates::embedded().map_err(TaraError::ConfigError)?;
        Self::new(&templates)
    }

    pub fn from_path(path: &str) -> Result<Self, TaraError> {
        let templates = PromptTemplates::load(path).map_err(TaraError::ConfigError)?;
        Self::new(&templates)
    }

    pub fn render_advice(
        &self,
        origin: &str,
        destination: &str,
        profile: &ProfileAttributes,
    ) -> Result<String, TaraError> {
        let data = json!({
            "origin": origin,
            "destination": destination,
            "profile_context": profile_context(profile),
        });
        self.handlebars
            .render(EXPERT_ADVICE, &data)
            .map_err(|e| TaraError::AdvisoryError(format!("prompt render failed: {}", e)))
    }
}

/// `- key: value` lines for every non-empty attribute.
pub fn profile_context(profile: &ProfileAttributes) -> String {
    let lines: Vec<String> = profile
        .iter()
        .filter(|(_, value)| is_provided(value))
        .map(|(key, value)| match value {
            Value::String(text) => format!("- {}: {}", key, text),
            other => format!("- {}: {}", key, other),
        })
        .collect();

    if lines.is_empty() {
        "None provided.".to_string()
    } else {
        lines.join("\n")
    }
}

fn is_provided(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
