//! Hybrid search request construction and inspection.

use crate::keywords::extract_keywords;
use hybrid_rag_core::{AppError, AppResult, SearchSettings};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Index fields targeted by the two retrievers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFields {
    /// Field searched by the `query_string` retriever
    pub text_field: String,

    /// Field searched by the `semantic` retriever
    pub semantic_field: String,
}

impl SearchFields {
    pub fn new(text_field: impl Into<String>, semantic_field: impl Into<String>) -> Self {
        Self {
            text_field: text_field.into(),
            semantic_field: semantic_field.into(),
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self::new(&settings.text_field, &settings.semantic_field)
    }
}

impl Default for SearchFields {
    fn default() -> Self {
        Self::from_settings(&SearchSettings::default())
    }
}

/// A search request body sent to the backend.
///
/// Requests built locally always combine a keyword retriever and a semantic
/// retriever under `retriever.rrf`, in that order, plus a `size`. Requests
/// written by the LLM are only required to contain `retriever.rrf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchRequest(Value);

impl SearchRequest {
    /// Build the fixed reciprocal-rank-fusion request.
    pub fn hybrid(keywords: &str, question: &str, fields: &SearchFields, size: usize) -> Self {
        Self(json!({
            "retriever": {
                "rrf": {
                    "retrievers": [
                        {
                            "standard": {
                                "query": {
                                    "query_string": {
                                        "default_field": fields.text_field,
                                        "query": keywords
                                    }
                                }
                            }
                        },
                        {
                            "standard": {
                                "query": {
                                    "semantic": {
                                        "field": fields.semantic_field,
                                        "query": question
                                    }
                                }
                            }
                        }
                    ]
                }
            },
            "size": size
        }))
    }

    /// Build a request with heuristic keywords and the question verbatim as
    /// the semantic query.
    pub fn heuristic(question: &str, fields: &SearchFields, size: usize) -> Self {
        Self::hybrid(&extract_keywords(question), question, fields, size)
    }

    /// Accept an arbitrary JSON value as long as it contains `retriever.rrf`.
    pub fn from_value(value: Value) -> AppResult<Self> {
        if !value.is_object() {
            return Err(AppError::Search(
                "Search request must be a JSON object".to_string(),
            ));
        }

        if !Self::has_rrf(&value) {
            return Err(AppError::Search(
                "Search request is missing retriever.rrf".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// Parse and validate a request from JSON text.
    pub fn from_json_str(text: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Whether `value` contains the `retriever.rrf` key path.
    pub fn has_rrf(value: &Value) -> bool {
        value
            .get("retriever")
            .and_then(|retriever| retriever.get("rrf"))
            .is_some()
    }

    /// The `size` value, when present and numeric.
    pub fn size(&self) -> Option<u64> {
        self.0.get("size").and_then(Value::as_u64)
    }

    /// Insert `size` only when the request has none.
    pub fn ensure_size(&mut self, size: usize) {
        if let Value::Object(ref mut map) = self.0 {
            map.entry("size").or_insert_with(|| json!(size));
        }
    }

    /// The retrievers combined by RRF, if any.
    pub fn retrievers(&self) -> &[Value] {
        self.0
            .pointer("/retriever/rrf/retrievers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The boolean keyword expression of the first `query_string` retriever.
    pub fn keyword_query(&self) -> Option<&str> {
        self.retrievers().iter().find_map(|r| {
            r.pointer("/standard/query/query_string/query")
                .and_then(Value::as_str)
        })
    }

    /// The text of the first `semantic` retriever.
    pub fn semantic_query(&self) -> Option<&str> {
        self.retrievers().iter().find_map(|r| {
            r.pointer("/standard/query/semantic/query")
                .and_then(Value::as_str)
        })
    }

    /// Whether the request has exactly the locally built two-retriever shape.
    pub fn is_hybrid_shape(&self) -> bool {
        let retrievers = self.retrievers();
        retrievers.len() == 2
            && retrievers[0]
                .pointer("/standard/query/query_string")
                .is_some()
            && retrievers[1].pointer("/standard/query/semantic").is_some()
            && self.size().is_some()
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}
