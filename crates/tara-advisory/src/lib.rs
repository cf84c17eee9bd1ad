//! TARA advisory service
//!
//! Renders the expert prompt from YAML templates, calls the Mistral
//! chat-completions endpoint and parses the JSON reply into an
//! [`tara_core::AdvisoryResult`].

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{MistralAdvisor, MistralConfig};
pub use parse::parse_advice;
pub use prompt::{profile_context, PromptRenderer, PromptTemplates};
