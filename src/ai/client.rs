//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the chat-completion call that turns a prompt into post text.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::AppConfig;
use crate::errors::PosterError;
use crate::retry::with_retry;

const SYSTEM_PROMPT: &str = "You are a social media content creator.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling limits for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GenerationParams {
    /// Sized to X's 280 character limit.
    pub const POST: Self = Self {
        max_tokens: 280,
        temperature: 0.7,
    };
}

/// Anything that can turn a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, PosterError>;
}

/// `OpenAI` chat-completion client
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    org_id: Option<String>,
    model_name: String,
    base_url: String,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_key: String,
        org_id: Option<String>,
        model_name: String,
        base_url: String,
    ) -> Result<Self, PosterError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PosterError::HttpError(format!("Failed to build OpenAI HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            org_id,
            model_name,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, PosterError> {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_org_id.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
        )
    }

    #[must_use]
    pub fn build_messages(&self, prompt: &str) -> Vec<ChatCompletionMessage> {
        vec![
            ChatCompletionMessage {
                role: MessageRole::system,
                content: Content::Text(SYSTEM_PROMPT.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            ChatCompletionMessage {
                role: MessageRole::user,
                content: Content::Text(prompt.to_string()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
        ]
    }

    async fn request_completion(&self, request_body: &Value) -> Result<String, PosterError> {
        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request_body);
        if let Some(org) = &self.org_id {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PosterError::transport("OpenAI API request failed", &e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            let message = format!("OpenAI API error (status {status}): {error_text}");
            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                PosterError::RateLimited(message)
            } else if status.is_server_error() {
                PosterError::Unavailable(message)
            } else {
                PosterError::GenerationFailure(message)
            });
        }

        let response_json: Value = response.json().await.map_err(|e| {
            PosterError::GenerationFailure(format!("Failed to parse OpenAI response: {e}"))
        })?;

        extract_completion_text(&response_json)
            .ok_or_else(|| PosterError::GenerationFailure("No text in response".to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate_text(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, PosterError> {
        #[cfg(feature = "debug-logs")]
        info!("Using prompt:\n{}", prompt);

        #[cfg(not(feature = "debug-logs"))]
        info!(
            model = %self.model_name,
            prompt_chars = prompt.chars().count(),
            "Requesting completion"
        );

        let request_body = json!({
            "model": self.model_name,
            "messages": chat_input_from_messages(&self.build_messages(prompt)),
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        let text = with_retry(|| self.request_completion(&request_body)).await?;
        debug!(chars = text.chars().count(), "Completion received");
        Ok(text)
    }
}

/// Chat Completions wire format for the typed prompt messages.
pub(crate) fn chat_input_from_messages(messages: &[ChatCompletionMessage]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };
            match &m.content {
                Content::Text(t) => Some(json!({ "role": role_str, "content": t })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

/// First choice's message content, trimmed. Blank output counts as no output.
pub(crate) fn extract_completion_text(response: &Value) -> Option<String> {
    response
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
