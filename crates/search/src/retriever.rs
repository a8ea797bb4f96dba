//! Retrieval over a shared search backend.

use crate::backend::SearchBackend;
use crate::document::Document;
use crate::request::{SearchFields, SearchRequest};
use hybrid_rag_core::AppResult;
use std::sync::Arc;

/// Outcome of one retrieval: the request as it was sent and the hits in
/// backend ranking order.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub request: SearchRequest,
    pub documents: Vec<Document>,
}

/// Executes search requests against one index.
///
/// Each call issues exactly one backend request. Backend errors are returned
/// unchanged; there is no retry and no partial result.
#[derive(Clone)]
pub struct Retriever {
    backend: Arc<dyn SearchBackend>,
    index: String,
    fields: SearchFields,
}

impl Retriever {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        index: impl Into<String>,
        fields: SearchFields,
    ) -> Self {
        Self {
            backend,
            index: index.into(),
            fields,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn fields(&self) -> &SearchFields {
        &self.fields
    }

    /// Execute a prepared request. `size` is only applied when the request
    /// does not set one.
    pub async fn search(&self, mut request: SearchRequest, size: usize) -> AppResult<Retrieval> {
        request.ensure_size(size);

        tracing::info!(
            "Search request for index {} via {}:\n{}",
            self.index,
            self.backend.backend_name(),
            request.to_pretty_string()
        );

        let response = self.backend.search(&self.index, request.as_json()).await?;
        let documents = response.into_documents();

        tracing::info!("Retrieved {} documents", documents.len());
        Ok(Retrieval { request, documents })
    }

    /// Build a hybrid request from `text` with heuristic keywords and execute it.
    pub async fn semantic_search(&self, text: &str, size: usize) -> AppResult<Retrieval> {
        let request = SearchRequest::heuristic(text, &self.fields, size);

        tracing::info!("Running RRF search for: '{}'", text);
        if let Some(keywords) = request.keyword_query() {
            tracing::info!("Extracted keywords: '{}'", keywords);
        }

        self.search(request, size).await
    }
}
