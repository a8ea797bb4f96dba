//! OpenAI-compatible chat completions provider.
//!
//! Serves both Groq (`https://api.groq.com/openai/v1`) and OpenAI
//! (`https://api.openai.com/v1`); they expose the same `/chat/completions`
//! API with bearer-token authentication.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use crate::types::ProviderType;
use hybrid_rag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single chat message.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completions request body.
#[derive(Debug, Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Chat completions response body.
#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionsClient {
    /// Provider this client talks to
    provider: ProviderType,

    /// Base URL, without the `/chat/completions` suffix
    base_url: String,

    /// Bearer token
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    /// Create a client for `provider`, using its default endpoint unless
    /// `base_url` is given.
    pub fn new(
        provider: ProviderType,
        base_url: Option<&str>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| provider.default_endpoint())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            provider,
            base_url,
            api_key: api_key.into(),
            client,
        })
    }

    /// Convert LlmRequest to the chat completions format.
    fn to_chat_request(&self, request: &LlmRequest) -> ChatCompletionsRequest {
        let mut messages = Vec::with_capacity(2);

        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatCompletionsRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature,
        }
    }

    /// Convert the API response to LlmResponse, keeping the first choice.
    fn convert_response(&self, response: ChatCompletionsResponse) -> AppResult<LlmResponse> {
        let content = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| {
                AppError::Llm(format!(
                    "{} returned a response without choices",
                    self.provider.as_str()
                ))
            })?;

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response.model,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for ChatCompletionsClient {
    fn provider_name(&self) -> &str {
        self.provider.as_str()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(
            provider = self.provider.as_str(),
            model = %request.model,
            "Sending chat completion request"
        );
        tracing::debug!("Request: {:?}", request);

        let body = self.to_chat_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::Connection(format!(
                    "Failed to send request to {}: {}",
                    self.provider.as_str(),
                    e
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "{} API error ({}): {}",
                self.provider.as_str(),
                status,
                error_text
            )));
        }

        let chat_response: ChatCompletionsResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!(
                "Failed to parse {} response: {}",
                self.provider.as_str(),
                e
            ))
        })?;

        let result = self.convert_response(chat_response)?;

        tracing::info!(
            total_tokens = result.usage.total_tokens,
            "Received chat completion"
        );

        Ok(result)
    }
}
