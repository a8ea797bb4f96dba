//! Error types for the hybrid RAG tool.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, connectivity, search backend, LLM,
//! prompt rendering and serialization.

use thiserror::Error;

/// Unified error type for the hybrid RAG tool.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (missing credentials, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend unreachable or authentication rejected
    #[error("Connection error: {0}")]
    Connection(String),

    /// Search backend errors (rejected request, unexpected response)
    #[error("Search error: {0}")]
    Search(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
