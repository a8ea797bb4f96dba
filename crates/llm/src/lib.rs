//! LLM integration crate for the hybrid RAG tool.
//!
//! This crate provides a provider-agnostic abstraction for chat-style
//! completions. Every provider receives a system instruction and a single
//! user message and returns the text of the first completion.
//!
//! # Providers
//! - **Groq** (default) and **OpenAI**: OpenAI-compatible `/chat/completions`
//! - **Ollama**: local runtime via `/api/chat`
//! - **Mock**: canned replies for tests
//!
//! # Example
//! ```no_run
//! use hybrid_rag_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("groq", None, Some("gsk_..."), 60)?;
//! let request = LlmRequest::new("Olá!", "llama3-70b-8192").with_temperature(0.3);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{ChatCompletionsClient, MockLlmClient, OllamaClient};
pub use types::ProviderType;
