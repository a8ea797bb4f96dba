//! Hybrid RAG pipeline.
//!
//! Sequences the three stages of a request:
//! 1. prepare a hybrid search request (LLM-written or heuristic)
//! 2. retrieve documents from the search backend
//! 3. generate an answer grounded in those documents
//!
//! # Example
//! ```no_run
//! use hybrid_rag_core::AppConfig;
//! use hybrid_rag_pipeline::RagPipeline;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let pipeline = RagPipeline::connect(&config).await?;
//! println!("{}", pipeline.process_query("O que é RRF?", true).await);
//! # Ok(())
//! # }
//! ```

pub mod answerer;
pub mod pipeline;
pub mod query_builder;

// Re-export main types
pub use answerer::{build_context, Answerer, NO_INFORMATION_MESSAGE};
pub use pipeline::{render_error, QueryMode, RagAnswer, RagPipeline, Stage, ERROR_PREFIX};
pub use query_builder::{parse_llm_query, QueryBuilder};
