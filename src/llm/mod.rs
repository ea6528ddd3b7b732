//! Chat-completion client for an OpenAI-compatible endpoint (Groq by default).

mod engine;

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::ConversationEngine;

pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

pub const API_KEY_VAR: &str = "GROQ_API_KEY";
pub const URL_VAR: &str = "GROQ_CHAT_COMPLETIONS_URL";

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            chat_completions_url: DEFAULT_CHAT_COMPLETIONS_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.chat_completions_url = url.into();
        self
    }

    /// Read the credential and optional endpoint override from the
    /// environment. A missing or blank key yields `Ok(None)`.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = optional_trimmed_env(API_KEY_VAR) else {
            return Ok(None);
        };
        let url = optional_trimmed_env(URL_VAR)
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidConfiguration(format!(
                "{URL_VAR} must start with http:// or https://"
            )));
        }
        Ok(Some(Self::new(api_key).with_url(url)))
    }
}

fn optional_trimmed_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("GROQ_API_KEY is not set")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One prompt, optionally grounded in context text.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub context: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// `[system "Context: …"]?` followed by the prompt as the only user message.
    /// Blank context is treated as none.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(context) = self.context.as_deref().filter(|c| !c.trim().is_empty()) {
            messages.push(ChatMessage {
                role: Role::System,
                content: format!("Context: {context}"),
            });
        }
        messages.push(ChatMessage {
            role: Role::User,
            content: self.prompt.clone(),
        });
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_without_context_are_a_single_user_turn() {
        let messages = CompletionRequest::new("What is 2+2?").messages();
        assert_eq!(
            messages,
            vec![ChatMessage {
                role: Role::User,
                content: "What is 2+2?".into()
            }]
        );
    }

    #[test]
    fn context_becomes_a_leading_system_message() {
        let messages = CompletionRequest::new("Summarize").with_context("X").messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "Context: X");
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Summarize");
    }

    #[test]
    fn blank_context_adds_no_system_message() {
        for context in ["", "  \n"] {
            let messages = CompletionRequest::new("hi").with_context(context).messages();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].role, Role::User);
        }
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage {
            role: Role::System,
            content: "c".into(),
        })
        .unwrap();
        assert_eq!(json["role"], "system");
    }

    #[test]
    fn default_parameters() {
        let config = CompletionConfig::new("k");
        assert_eq!(config.model, "llama3-8b-8192");
        assert_eq!(config.max_tokens, 1024);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.chat_completions_url, DEFAULT_CHAT_COMPLETIONS_URL);
    }
}
