use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{CompletionConfig, CompletionError, CompletionRequest};

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Submits prompts to the chat-completion endpoint. Without a config every
/// call fails with `NotConfigured` and nothing touches the network.
#[derive(Clone)]
pub struct ConversationEngine {
    client: reqwest::Client,
    config: Option<CompletionConfig>,
}

impl ConversationEngine {
    pub fn new(config: Option<CompletionConfig>) -> Self {
        if config.is_none() {
            warn!("No completion credential configured; AI replies are unavailable");
        }
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    pub async fn ask(&self, prompt: &str, context: Option<&str>) -> Result<String, CompletionError> {
        let mut request = CompletionRequest::new(prompt);
        if let Some(context) = context {
            request = request.with_context(context);
        }
        self.complete(&request).await
    }

    /// One request, no retry. Returns the first choice's content as-is.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let config = self.config.as_ref().ok_or(CompletionError::NotConfigured)?;

        let body = serde_json::json!({
            "model": config.model,
            "messages": request.messages(),
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
        });

        debug!(
            model = %config.model,
            has_context = request.context.is_some(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&config.chat_completions_url)
            .bearer_auth(&config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Chat completion rejected");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("response has no choices".into()))?
            .message
            .content
            .ok_or_else(|| CompletionError::MalformedResponse("choice has no content".into()))?;

        info!(chars = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_engine_fails_without_network() {
        let engine = ConversationEngine::new(None);
        assert!(!engine.is_configured());
        assert_eq!(
            engine.ask("hello", None).await,
            Err(CompletionError::NotConfigured)
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let config = CompletionConfig::new("k").with_url("http://127.0.0.1:9/chat/completions");
        let engine = ConversationEngine::new(Some(config));
        match engine.ask("hello", None).await {
            Err(CompletionError::Transport(_)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }
}
