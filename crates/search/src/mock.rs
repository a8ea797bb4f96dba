//! In-memory search backend for tests and offline development.

use crate::backend::SearchBackend;
use crate::document::{Document, SearchHit, SearchResponse};
use hybrid_rag_core::{AppError, AppResult};
use serde_json::Value;
use std::sync::Mutex;

/// Mock backend returning canned documents or a fixed connection error.
///
/// Every request body is recorded together with the index it targeted.
#[derive(Debug, Default)]
pub struct MockSearchBackend {
    documents: Vec<Document>,
    failure: Option<String>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl MockSearchBackend {
    /// A backend that finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that answers every search with `documents`.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// A backend whose every search fails with a connection error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// `(index, body)` of every search received, in order.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl SearchBackend for MockSearchBackend {
    fn backend_name(&self) -> &str {
        "mock"
    }

    async fn search(&self, index: &str, body: &Value) -> AppResult<SearchResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((index.to_string(), body.clone()));
        }

        if let Some(ref message) = self.failure {
            return Err(AppError::Connection(message.clone()));
        }

        let hits = self
            .documents
            .iter()
            .map(|doc| SearchHit {
                id: doc.id.clone(),
                score: Some(doc.score),
                source: doc.source.clone(),
            })
            .collect();

        Ok(SearchResponse::from_hits(hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    #[tokio::test]
    async fn test_returns_documents_and_records_request() {
        let backend =
            MockSearchBackend::with_documents(vec![Document::new("1", 2.0, Map::new())]);

        let response = backend
            .search("documentos", &json!({"size": 1}))
            .await
            .unwrap();

        assert_eq!(response.into_documents()[0].id, "1");
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.requests()[0].0, "documentos");
        assert_eq!(backend.requests()[0].1["size"], 1);
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let backend = MockSearchBackend::failing("connection refused");
        let result = backend.search("documentos", &json!({})).await;

        assert!(matches!(result, Err(AppError::Connection(_))));
        assert_eq!(backend.call_count(), 1);
    }
}
