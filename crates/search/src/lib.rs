//! Hybrid retrieval over an Elasticsearch-compatible backend.
//!
//! Builds reciprocal-rank-fusion (RRF) requests that combine a keyword
//! `query_string` retriever with a `semantic` retriever, executes them and
//! normalizes the hits into [`Document`]s.

pub mod backend;
pub mod document;
pub mod elasticsearch;
pub mod keywords;
pub mod mock;
pub mod request;
pub mod retriever;

// Re-export commonly used types
pub use backend::SearchBackend;
pub use document::{Document, SearchHit, SearchResponse};
pub use elasticsearch::{cloud_id_to_url, ElasticsearchClient};
pub use keywords::{extract_keywords, STOP_WORDS};
pub use mock::MockSearchBackend;
pub use request::{SearchFields, SearchRequest};
pub use retriever::{Retrieval, Retriever};
