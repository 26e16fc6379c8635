//! ChatModelBrain: a Brain backed by an OpenAI-compatible chat endpoint.

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::brain::{classify_reply, Brain, BrainRequest, BrainTurn};
use crate::error::BrainError;

/// Configuration for ChatModelBrain.
#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    /// Base URL of the chat-completions API.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    pub temperature: Option<f32>,
}

impl Default for ChatModelConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.2),
        }
    }
}

impl ChatModelConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `CHAT_MODEL_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `CHAT_MODEL_API_URL` - API URL (default: https://api.openai.com)
    /// - `CHAT_MODEL_NAME` - Model name (default: gpt-4o-mini)
    /// - `CHAT_MODEL_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `CHAT_MODEL_TEMPERATURE` - Temperature (default: 0.2)
    pub fn from_env() -> Result<Self, BrainError> {
        let api_key = env::var("CHAT_MODEL_API_KEY")
            .map_err(|_| BrainError::Configuration("CHAT_MODEL_API_KEY not set".to_string()))?;

        let api_url =
            env::var("CHAT_MODEL_API_URL").unwrap_or_else(|_| "https://api.openai.com".to_string());

        let model = env::var("CHAT_MODEL_NAME").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let max_tokens = env::var("CHAT_MODEL_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(1024));

        let temperature = env::var("CHAT_MODEL_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(0.2));

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
        })
    }
}

/// A brain that asks an OpenAI-compatible chat model whether a question
/// needs a catalog query, and if so which one.
pub struct ChatModelBrain {
    client: Client,
    config: ChatModelConfig,
}

impl ChatModelBrain {
    /// Create a new ChatModelBrain with the given configuration.
    pub fn new(config: ChatModelConfig) -> Result<Self, BrainError> {
        let client = Client::builder().build().map_err(|e| {
            BrainError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        info!("ChatModelBrain initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a ChatModelBrain from environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(ChatModelConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChatModelConfig {
        &self.config
    }

    fn build_messages(&self, request: &BrainRequest<'_>) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(system_prompt(request.schema))];
        messages.push(ChatMessage::user(request.question));
        if let Some(failure) = request.failure {
            messages.push(ChatMessage::user(format!(
                "The previous query failed: {failure}. \
                 Answer again, with a corrected query or with plain text."
            )));
        }
        messages
    }

    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResponse, BrainError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending chat completion request: {:?}", request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| BrainError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(BrainError::ProcessingFailed(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    api_error.error.message
                )));
            }

            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            BrainError::ProcessingFailed(format!("Failed to parse response: {}", e))
        })?;

        debug!("Received chat completion response: {:?}", completion);

        Ok(completion)
    }
}

#[async_trait]
impl Brain for ChatModelBrain {
    async fn reply(&self, request: BrainRequest<'_>) -> Result<BrainTurn, BrainError> {
        let messages = self.build_messages(&request);
        let completion = self.chat_completion(messages).await?;

        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                warn!("No content in chat completion response");
                String::new()
            });

        if let Some(usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        if text.trim().is_empty() {
            return Err(BrainError::ProcessingFailed(
                "model returned an empty reply".to_string(),
            ));
        }

        Ok(classify_reply(&text))
    }

    fn name(&self) -> &str {
        "ChatModelBrain"
    }
}

fn system_prompt(schema: &str) -> String {
    format!(
        "You are a wine catalog assistant backed by a read-only SQLite table.\n\
         {schema}\n\
         When the question needs data, answer with a single SELECT statement \
         and nothing else. Use LIKE with % wildcards for name matching. \
         Otherwise answer in plain text."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brain_name() {
        let config = ChatModelConfig {
            api_key: "test-key".to_string(),
            ..ChatModelConfig::default()
        };
        let brain = ChatModelBrain::new(config).unwrap();
        assert_eq!(brain.name(), "ChatModelBrain");
    }

    #[test]
    fn test_build_messages_includes_schema_and_failure() {
        let config = ChatModelConfig {
            api_key: "test-key".to_string(),
            ..ChatModelConfig::default()
        };
        let brain = ChatModelBrain::new(config).unwrap();

        let request = BrainRequest {
            question: "best merlot?",
            schema: "Table: wine_cards_wide",
            failure: Some("query timed out"),
        };
        let messages = brain.build_messages(&request);
        assert_eq!(messages.len(), 3);
        assert!(messages[0].content.contains("wine_cards_wide"));
        assert_eq!(messages[1].content, "best merlot?");
        assert!(messages[2].content.contains("timed out"));
    }
}
