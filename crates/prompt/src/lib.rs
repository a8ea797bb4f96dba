//! Prompt system for the hybrid RAG tool.
//!
//! This crate provides the two prompts the pipeline sends to the LLM:
//! - query preparation (question -> hybrid Elasticsearch query)
//! - answer generation (question + retrieved context -> answer)
//!
//! Templates use Handlebars syntax. Built-in defaults can be replaced by
//! YAML prompt definitions on disk or by inline overrides in the config.

pub mod builder;
pub mod loader;
pub mod templates;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, render_template};
pub use loader::load_prompt;
pub use templates::{PromptTemplates, ANSWER_GENERATION_ID, QUERY_PREPARATION_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
