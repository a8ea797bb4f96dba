//! LLM provider factory.
//!
//! This module creates LLM clients from configuration values. It handles
//! provider resolution and secret checks; the resulting client is built once
//! and shared for the lifetime of the pipeline.

use crate::client::LlmClient;
use crate::providers::{ChatCompletionsClient, OllamaClient};
use crate::types::ProviderType;
use hybrid_rag_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("groq", "openai", "ollama")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key (required by groq and openai)
/// * `timeout_secs` - Request timeout
///
/// # Errors
/// Returns a configuration error if the provider is unknown or a required
/// API key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: u64,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown provider: {}. Supported: groq, openai, ollama",
            provider
        ))
    })?;

    tracing::info!("Initializing {} client", provider_type.as_str());

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(provider_type.default_endpoint());
            let client = OllamaClient::with_base_url(base_url, timeout_secs)?;
            Ok(Arc::new(client))
        }
        ProviderType::Groq | ProviderType::OpenAI => {
            let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Config(format!(
                    "{} provider requires an API key",
                    provider_type.as_str()
                ))
            })?;
            let client =
                ChatCompletionsClient::new(provider_type, endpoint, api_key, timeout_secs)?;
            Ok(Arc::new(client))
        }
    }
}
