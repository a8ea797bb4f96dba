//! Hybrid RAG Core Library
//!
//! This crate provides the foundational utilities shared by every other
//! crate in the workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (search backend, LLM, prompts)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, LlmSettings, PromptSettings, SearchSettings};
pub use error::{AppError, AppResult};
