//! Retrieved documents and the search response wire format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A retrieved document, in backend ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub score: f64,
    pub source: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, score: f64, source: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            score,
            source,
        }
    }

    /// A source field as text: strings raw, other values as JSON text.
    pub fn field_text(&self, field: &str) -> Option<String> {
        self.source.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// One entry of `hits.hits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,

    /// Null when the backend does not score the hit
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,

    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl From<SearchHit> for Document {
    fn from(hit: SearchHit) -> Self {
        Document::new(hit.id, hit.score.unwrap_or(0.0), hit.source)
    }
}

/// The subset of the `_search` response body the pipeline consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: SearchHits,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

impl SearchResponse {
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits: SearchHits { hits },
        }
    }

    /// Convert hits to documents, preserving order.
    pub fn into_documents(self) -> Vec<Document> {
        self.hits.hits.into_iter().map(Document::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search_response() {
        let body = json!({
            "took": 3,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_index": "documentos", "_id": "a", "_score": 1.5, "_source": {"texto": "um"}},
                    {"_index": "documentos", "_id": "b", "_score": null, "_source": {"texto": "dois"}}
                ]
            }
        });

        let response: SearchResponse = serde_json::from_value(body).unwrap();
        let docs = response.into_documents();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[0].score, 1.5);
        assert_eq!(docs[1].id, "b");
        assert_eq!(docs[1].score, 0.0);
        assert_eq!(docs[1].field_text("texto").as_deref(), Some("dois"));
    }

    #[test]
    fn test_missing_score_and_source() {
        let hit: SearchHit = serde_json::from_value(json!({"_id": "x"})).unwrap();
        let doc = Document::from(hit);
        assert_eq!(doc.score, 0.0);
        assert!(doc.source.is_empty());
    }

    #[test]
    fn test_field_text_non_string() {
        let mut source = Map::new();
        source.insert("ano".to_string(), json!(2024));
        let doc = Document::new("1", 1.0, source);
        assert_eq!(doc.field_text("ano").as_deref(), Some("2024"));
        assert!(doc.field_text("missing").is_none());
    }

    #[test]
    fn test_empty_response() {
        let response: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.into_documents().is_empty());
    }
}
