//! Search backend abstraction.

use crate::document::SearchResponse;
use hybrid_rag_core::AppResult;
use serde_json::Value;

/// A service that executes search request bodies against an index.
///
/// Implementations are built once and shared read-only between requests.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Name used in logs (e.g., "elasticsearch")
    fn backend_name(&self) -> &str;

    /// Execute `body` against `index`.
    ///
    /// # Errors
    /// Authentication, connectivity and rejected requests are returned as
    /// errors; no retry is attempted.
    async fn search(&self, index: &str, body: &Value) -> AppResult<SearchResponse>;
}
