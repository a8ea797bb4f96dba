//! Search request preparation.
//!
//! In LLM mode the model writes the hybrid request from the question. Any
//! completion that is not a usable request falls back to the local keyword
//! heuristic, so a malformed model output never fails the pipeline.

use hybrid_rag_core::AppResult;
use hybrid_rag_llm::{LlmClient, LlmRequest};
use hybrid_rag_prompt::{build_prompt, PromptDefinition};
use hybrid_rag_search::{SearchFields, SearchRequest};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").ok());

/// Parse a model completion into a search request.
///
/// The first fenced code block is used when present, otherwise the whole
/// text. The JSON must be an object containing `retriever.rrf`.
pub fn parse_llm_query(text: &str) -> AppResult<SearchRequest> {
    let candidate = FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    SearchRequest::from_json_str(candidate.trim())
}

/// Turns a user question into a hybrid search request.
pub struct QueryBuilder {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    template: PromptDefinition,
    fields: SearchFields,
}

impl QueryBuilder {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        temperature: f32,
        template: PromptDefinition,
        fields: SearchFields,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature,
            template,
            fields,
        }
    }

    pub fn fields(&self) -> &SearchFields {
        &self.fields
    }

    /// Build the request for `user_query`.
    ///
    /// With `use_llm` false no completion is requested. With `use_llm` true a
    /// failing completion call is returned as an error, while an unusable
    /// completion is replaced by the heuristic request.
    pub async fn build_query(
        &self,
        user_query: &str,
        max_results: usize,
        use_llm: bool,
    ) -> AppResult<SearchRequest> {
        if !use_llm {
            return Ok(SearchRequest::heuristic(
                user_query,
                &self.fields,
                max_results,
            ));
        }

        let mut variables = HashMap::new();
        variables.insert("query".to_string(), user_query.to_string());
        variables.insert("text_field".to_string(), self.fields.text_field.clone());
        variables.insert(
            "semantic_field".to_string(),
            self.fields.semantic_field.clone(),
        );
        variables.insert("max_results".to_string(), max_results.to_string());

        let prompt = build_prompt(&self.template, variables)?;
        tracing::debug!("Query preparation prompt:\n{}", prompt.user);

        let mut request =
            LlmRequest::new(prompt.user, &self.model).with_temperature(self.temperature);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        tracing::info!("Preparing search request with {}", self.llm.provider_name());
        let response = self.llm.complete(&request).await?;
        tracing::debug!("Raw query preparation output:\n{}", response.content);

        match parse_llm_query(&response.content) {
            Ok(search_request) => {
                tracing::info!("Using search request written by the LLM");
                Ok(search_request)
            }
            Err(e) => {
                tracing::warn!(
                    "LLM output is not a usable search request ({}), using keyword fallback",
                    e
                );
                Ok(SearchRequest::heuristic(
                    user_query,
                    &self.fields,
                    max_results,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_rag_core::AppError;
    use hybrid_rag_llm::MockLlmClient;
    use hybrid_rag_prompt::PromptTemplates;

    const QUESTION: &str = "Como posso melhorar meu sono com meditação?";

    const LLM_QUERY: &str = r#"{
  "retriever": {
    "rrf": {
      "retrievers": [
        {"standard": {"query": {"query_string": {"default_field": "texto", "query": "(sono) OR (meditação)"}}}},
        {"standard": {"query": {"semantic": {"field": "semantic_text", "query": "Como posso melhorar meu sono com meditação?"}}}}
      ]
    }
  },
  "size": 5
}"#;

    fn builder(llm: Arc<MockLlmClient>) -> QueryBuilder {
        QueryBuilder::new(
            llm,
            "llama3-70b-8192",
            0.3,
            PromptTemplates::defaults().query,
            SearchFields::default(),
        )
    }

    #[test]
    fn test_parse_plain_json() {
        let request = parse_llm_query(LLM_QUERY).unwrap();
        assert_eq!(request.keyword_query(), Some("(sono) OR (meditação)"));
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = format!("Aqui está a consulta:\n```json\n{}\n```\nBoa busca!", LLM_QUERY);
        let request = parse_llm_query(&text).unwrap();
        assert_eq!(request.semantic_query(), Some(QUESTION));

        let bare_fence = format!("```\n{}\n```", LLM_QUERY);
        assert!(parse_llm_query(&bare_fence).is_ok());
    }

    #[test]
    fn test_parse_rejects_missing_rrf() {
        let result = parse_llm_query(r#"{"query": {"match": {"texto": "sono"}}}"#);
        assert!(matches!(result, Err(AppError::Search(_))));
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_llm_query("Desculpe, não consigo ajudar.").is_err());
    }

    #[tokio::test]
    async fn test_direct_mode_skips_llm() {
        let llm = Arc::new(MockLlmClient::new(LLM_QUERY));
        let request = builder(llm.clone())
            .build_query(QUESTION, 5, false)
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 0);
        assert_eq!(
            request.keyword_query(),
            Some("(posso) OR (melhorar) OR (meu) OR (sono) OR (com) OR (meditação)")
        );
        assert_eq!(request.semantic_query(), Some(QUESTION));
    }

    #[tokio::test]
    async fn test_llm_mode_uses_model_output() {
        let llm = Arc::new(MockLlmClient::new(format!("```json\n{}\n```", LLM_QUERY)));
        let request = builder(llm.clone())
            .build_query(QUESTION, 5, true)
            .await
            .unwrap();

        assert_eq!(request.keyword_query(), Some("(sono) OR (meditação)"));
        assert_eq!(llm.call_count(), 1);

        let requests = llm.requests();
        let sent = &requests[0];
        assert_eq!(sent.model, "llama3-70b-8192");
        assert_eq!(sent.temperature, Some(0.3));
        assert!(sent.prompt.contains(QUESTION));
        assert!(sent
            .system
            .as_deref()
            .unwrap_or_default()
            .contains("gerar consultas Elasticsearch"));
    }

    #[tokio::test]
    async fn test_invalid_output_falls_back() {
        for output in ["not json at all", "{\"size\": 5}", "```json\n{broken\n```", "[]"] {
            let llm = Arc::new(MockLlmClient::new(output));
            let request = builder(llm)
                .build_query(QUESTION, 4, true)
                .await
                .unwrap();

            assert!(request.is_hybrid_shape(), "no fallback for {:?}", output);
            assert_eq!(request.semantic_query(), Some(QUESTION));
            assert_eq!(request.size(), Some(4));
        }
    }

    #[tokio::test]
    async fn test_fallback_matches_direct_request() {
        let llm = Arc::new(MockLlmClient::new("sem json"));
        let builder = builder(llm);

        let fallback = builder.build_query(QUESTION, 5, true).await.unwrap();
        let direct = builder.build_query(QUESTION, 5, false).await.unwrap();
        assert_eq!(fallback, direct);
    }

    #[tokio::test]
    async fn test_llm_transport_error_propagates() {
        let llm = Arc::new(MockLlmClient::new("").with_error("rate limited"));
        let result = builder(llm).build_query(QUESTION, 5, true).await;

        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
